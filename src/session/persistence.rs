//! Durable session storage.
//!
//! The whole session is written as one JSON document on every change. The
//! previous document is kept under a backup key and used when the primary
//! copy fails validation on load.

use rand_pcg::Lcg64Xsh32;
use rocket::serde::json::serde_json::{self, Value};
use rocket::serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use super::BattlePhase;
use crate::battle::MatchLedger;
use crate::card::Card;
use crate::opponent::Opponent;
use crate::zones::{ZoneSnapshot, ZoneStore};

pub const SESSION_KEY: &str = "pokemon_tcg_session";
pub const BACKUP_KEY: &str = "pokemon_tcg_session_backup";
pub const SAVE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    Io(String),
    Serialize(String),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceError::Io(e) => write!(f, "storage error: {}", e),
            PersistenceError::Serialize(e) => write!(f, "serialization error: {}", e),
        }
    }
}

impl std::error::Error for PersistenceError {}

/// Minimal durable key-value contract.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError>;
}

/// One `<key>.json` file per key inside `dir`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStore { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        match std::fs::read_to_string(self.path(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PersistenceError::Io(e.to_string())),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| PersistenceError::Io(e.to_string()))?;
        let path = self.path(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value).map_err(|e| PersistenceError::Io(e.to_string()))?;
        std::fs::rename(&tmp, &path).map_err(|e| PersistenceError::Io(e.to_string()))
    }
}

/// In-memory store. Clones share the same map, so a clone kept by a test
/// sees everything the session wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        match self.values.lock() {
            Ok(g) => g,
            Err(e) => e.into_inner(),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.map().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.map().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Opponent side and battle progress, kept apart from the player's zones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct SavedBattleState {
    pub opponent: Opponent,
    pub in_battle: bool,
    pub phase: BattlePhase,
    #[serde(default)]
    pub pre_battle: Option<ZoneSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct SavedSession {
    pub version: u32,
    pub collection: Vec<Card>,
    pub deck: Vec<Card>,
    pub hand: Vec<Card>,
    pub discard: Vec<Card>,
    #[serde(default)]
    pub battle_slot: Option<Card>,
    pub stats: MatchLedger,
    /// Always written, `null` when no booster was ever drawn.
    pub last_draw_time: Option<u64>,
    #[serde(default)]
    pub last_save_time: u64,
    #[serde(default)]
    pub battle_state: Option<SavedBattleState>,
    /// Session RNG, so a resumed game continues its card id stream instead of
    /// replaying it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rng: Option<Lcg64Xsh32>,
    /// Sequence number of the last notification.
    #[serde(default)]
    pub event_seq: u64,
}

impl SavedSession {
    pub fn zones(&self) -> ZoneStore {
        ZoneStore {
            collection: self.collection.clone(),
            deck: self.deck.clone(),
            hand: self.hand.clone(),
            discard: self.discard.clone(),
            battle_slot: self.battle_slot.clone(),
        }
    }

    /// The zone rules a live session keeps, checked on the stored document.
    pub fn check_invariants(&self) -> Result<(), String> {
        self.zones().check_invariants()?;
        match &self.battle_state {
            Some(state) => state.opponent.check_invariants(),
            None => Ok(()),
        }
    }
}

/// Structural check done before deserializing a stored document.
pub fn validate(value: &Value) -> Result<(), String> {
    for key in ["deck", "hand", "discard"] {
        if !value.get(key).map(Value::is_array).unwrap_or(false) {
            return Err(format!("`{}` is missing or not an array", key));
        }
    }
    if value.get("lastDrawTime").is_none() {
        return Err("`lastDrawTime` is missing".to_string());
    }
    match value.get("battleState") {
        None | Some(Value::Null) | Some(Value::Object(_)) => Ok(()),
        Some(_) => Err("`battleState` is not an object".to_string()),
    }
}

fn parse(raw: &str) -> Result<SavedSession, String> {
    let value: Value = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    validate(&value)?;
    let doc: SavedSession = serde_json::from_value(value).map_err(|e| e.to_string())?;
    doc.check_invariants()?;
    Ok(doc)
}

pub struct SessionPersistence {
    store: Box<dyn KeyValueStore>,
}

impl fmt::Debug for SessionPersistence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionPersistence").finish_non_exhaustive()
    }
}

impl SessionPersistence {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        SessionPersistence { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::new()))
    }

    /// Write `doc` as the current session, moving the previous one to the
    /// backup key first.
    pub fn save(&mut self, doc: &SavedSession) -> Result<(), PersistenceError> {
        let json =
            serde_json::to_string(doc).map_err(|e| PersistenceError::Serialize(e.to_string()))?;
        if let Some(previous) = self.store.get(SESSION_KEY)? {
            if parse(&previous).is_ok() {
                self.store.set(BACKUP_KEY, &previous)?;
            }
        }
        self.store.set(SESSION_KEY, &json)
    }

    /// Last valid saved session: the primary copy, else the backup, else `None`.
    pub fn load(&self) -> Option<SavedSession> {
        for key in [SESSION_KEY, BACKUP_KEY] {
            match self.store.get(key) {
                Ok(Some(raw)) => match parse(&raw) {
                    Ok(doc) => {
                        if key == BACKUP_KEY {
                            log::warn!("restored session from backup copy");
                        }
                        return Some(doc);
                    }
                    Err(e) => log::warn!("stored session under `{}` is invalid: {}", key, e),
                },
                Ok(None) => {}
                Err(e) => log::warn!("could not read `{}`: {}", key, e),
            }
        }
        log::info!("no saved session found, starting fresh");
        None
    }
}
