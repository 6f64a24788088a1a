//! Shared entry point to the session for concurrent callers.
//!
//! Every operation runs under the session lock, so mutations never
//! interleave. Operations that call the card supply additionally take an
//! in-flight flag: a second such request arriving while one is pending is
//! rejected with [`SessionError::SupplyBusy`] instead of waiting.

use rocket::futures::lock::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::action::SessionAction;
use crate::card::{CardSupply, CatalogSupply};
use crate::config::GameConfig;
use crate::cooldown::now_ms;
use crate::session::events::EventEntry;
use crate::session::persistence::{FileStore, KeyValueStore, MemoryStore, SessionPersistence};
use crate::session::{Session, SessionError};

pub struct GameService {
    session: Mutex<Session>,
    supply_in_flight: AtomicBool,
}

struct SupplyGuard<'a>(&'a AtomicBool);

impl Drop for SupplyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl GameService {
    pub fn new(session: Session) -> Self {
        GameService {
            session: Mutex::new(session),
            supply_in_flight: AtomicBool::new(false),
        }
    }

    /// Service backed by the built-in card catalog and the storage named in
    /// `config`.
    pub fn from_config(config: &GameConfig) -> Self {
        let supply: Arc<dyn CardSupply> = Arc::new(CatalogSupply::new());
        let store: Box<dyn KeyValueStore> = match &config.data_dir {
            Some(dir) => {
                log::info!("storing session in {}", dir.display());
                Box::new(FileStore::new(dir.clone()))
            }
            None => Box::new(MemoryStore::new()),
        };
        Self::new(Session::new(config, supply, SessionPersistence::new(store)))
    }

    pub async fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().await
    }

    fn claim_supply(&self) -> Result<SupplyGuard<'_>, SessionError> {
        self.supply_in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| SupplyGuard(&self.supply_in_flight))
            .map_err(|_| SessionError::SupplyBusy)
    }

    pub async fn perform(&self, action: SessionAction) -> Result<EventEntry, SessionError> {
        let _guard = if action.uses_supply() {
            Some(self.claim_supply()?)
        } else {
            None
        };
        let mut session = self.session.lock().await;
        match action {
            SessionAction::MoveCard { from, to, card_id } => {
                session.move_card(from, to, &card_id)
            }
            SessionAction::MoveOpponentCard { from, to, card_id } => {
                session.move_opponent_card(from, to, &card_id)
            }
            SessionAction::ShuffleDeck => Ok(session.shuffle_deck()),
            SessionAction::ClearZone { zone } => session.clear_zone(zone),
            SessionAction::DrawBooster => session.draw_booster(now_ms()).await,
            SessionAction::EnterBattle => session.enter_battle().await,
            SessionAction::ResolveBattle => session.resolve_battle(),
            SessionAction::Replay => session.replay().await,
            SessionAction::ExitBattle { policy } => session.exit_battle(policy),
            SessionAction::NewGame => Ok(session.new_game()),
            SessionAction::SetSeed { seed } => Ok(session.set_seed(seed)),
        }
    }
}
