use pokemon_tcg_battle::action::SessionAction;
use pokemon_tcg_battle::card::CatalogSupply;
use pokemon_tcg_battle::config::GameConfig;
use pokemon_tcg_battle::service::GameService;
use pokemon_tcg_battle::session::persistence::{
    FileStore, KeyValueStore, MemoryStore, PersistenceError, SessionPersistence, BACKUP_KEY,
    SESSION_KEY,
};
use pokemon_tcg_battle::session::{BattlePhase, Session};
use pokemon_tcg_battle::zones::ZoneName;
use rocket::serde::json::serde_json::{self, Value};
use std::sync::Arc;
use std::time::Duration;

fn config() -> GameConfig {
    GameConfig::default()
        .with_seed(21)
        .with_cooldown(Duration::from_secs(300))
}

fn session_on(store: Box<dyn KeyValueStore>) -> Session {
    Session::new(
        &config(),
        Arc::new(CatalogSupply::new()),
        SessionPersistence::new(store),
    )
}

fn temp_dir(tag: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "pokemon_tcg_battle_{}_{}",
        tag,
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

struct BrokenStore;

impl KeyValueStore for BrokenStore {
    fn get(&self, _key: &str) -> Result<Option<String>, PersistenceError> {
        Err(PersistenceError::Io("quota exceeded".to_string()))
    }

    fn set(&mut self, _key: &str, _value: &str) -> Result<(), PersistenceError> {
        Err(PersistenceError::Io("quota exceeded".to_string()))
    }
}

#[tokio::test]
async fn file_store_resumes_battle_in_progress() {
    let dir = temp_dir("resume");
    let (zones, opponent, ledger, snapshot, last_draw) = {
        let mut session = session_on(Box::new(FileStore::new(dir.clone())));
        session.draw_booster(5_000).await.expect("booster");
        let first = session.zones().cards(ZoneName::Collection)[0].id.clone();
        session
            .move_card(ZoneName::Collection, ZoneName::Hand, &first)
            .expect("to hand");
        session.enter_battle().await.expect("enter");
        (
            session.zones().clone(),
            session.opponent().clone(),
            session.ledger().clone(),
            session.pre_battle_snapshot().cloned(),
            session.cooldown().last_draw_ms(),
        )
    };

    let resumed = session_on(Box::new(FileStore::new(dir.clone())));
    assert_eq!(resumed.phase(), BattlePhase::Staging);
    assert_eq!(resumed.zones(), &zones);
    assert_eq!(resumed.opponent(), &opponent);
    assert_eq!(resumed.ledger(), &ledger);
    assert_eq!(resumed.pre_battle_snapshot().cloned(), snapshot);
    assert_eq!(resumed.cooldown().last_draw_ms(), Some(5_000));
    assert_eq!(last_draw, Some(5_000));

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn seeded_restarts_keep_card_ids_unique() {
    let dir = temp_dir("seeded_restart");
    let config = GameConfig {
        data_dir: Some(dir.clone()),
        ..GameConfig::default()
            .with_seed(7)
            .with_cooldown(Duration::ZERO)
    };

    let first = GameService::from_config(&config);
    first
        .perform(SessionAction::DrawBooster)
        .await
        .expect("first booster");
    drop(first);

    let second = GameService::from_config(&config);
    second
        .perform(SessionAction::DrawBooster)
        .await
        .expect("booster after restart");
    {
        let session = second.session().await;
        session.check_invariants().expect("ids stay unique");
        assert_eq!(session.zones().cards(ZoneName::Collection).len(), 10);
    }
    drop(second);

    let third = GameService::from_config(&config);
    let session = third.session().await;
    assert_eq!(session.zones().cards(ZoneName::Collection).len(), 10);
    drop(session);

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn primary_with_duplicate_ids_falls_back_to_backup() {
    let store = MemoryStore::new();
    let booster_ids: Vec<String> = {
        let mut session = session_on(Box::new(store.clone()));
        session.draw_booster(1_000).await.expect("booster");
        session.shuffle_deck();
        session
            .zones()
            .cards(ZoneName::Collection)
            .iter()
            .map(|c| c.id.clone())
            .collect()
    };
    let raw = store.get(SESSION_KEY).unwrap().expect("saved");
    let mut doc: Value = serde_json::from_str(&raw).unwrap();
    let copy = doc["collection"][0].clone();
    doc["deck"].as_array_mut().unwrap().push(copy);
    let mut writer = store.clone();
    writer.set(SESSION_KEY, &doc.to_string()).unwrap();

    let resumed = session_on(Box::new(store.clone()));
    let ids: Vec<String> = resumed
        .zones()
        .cards(ZoneName::Collection)
        .iter()
        .map(|c| c.id.clone())
        .collect();
    assert_eq!(ids, booster_ids);
    assert!(resumed.zones().cards(ZoneName::Deck).is_empty());
    resumed.check_invariants().expect("backup is consistent");
}

#[tokio::test]
async fn event_numbering_continues_after_restart() {
    let store = MemoryStore::new();
    {
        let mut session = session_on(Box::new(store.clone()));
        session.draw_booster(1_000).await.expect("booster");
        session.shuffle_deck();
        session.set_seed(3);
    }
    let mut resumed = session_on(Box::new(store.clone()));
    assert!(resumed.events().is_empty());
    assert_eq!(resumed.events().last_seq(), 3);
    assert_eq!(resumed.shuffle_deck().seq, 4);
}

#[tokio::test]
async fn saved_document_layout() {
    let store = MemoryStore::new();
    let mut session = session_on(Box::new(store.clone()));
    session.draw_booster(1_000).await.expect("booster");

    let raw = store.get(SESSION_KEY).unwrap().expect("session saved");
    let doc: Value = serde_json::from_str(&raw).expect("valid JSON");
    assert_eq!(doc["version"], 1);
    assert!(doc["lastSaveTime"].as_u64().is_some());
    assert_eq!(doc["lastDrawTime"], 1_000);
    assert_eq!(doc["collection"].as_array().map(Vec::len), Some(5));
    assert!(doc["deck"].is_array());
    assert_eq!(doc["stats"]["totalCardsDrawn"], 5);
    assert_eq!(doc["battleState"]["inBattle"], false);
    assert_eq!(
        doc["battleState"]["opponent"]["hand"].as_array().map(Vec::len),
        Some(5)
    );
}

#[tokio::test]
async fn corrupt_primary_falls_back_to_backup() {
    let store = MemoryStore::new();
    {
        let mut session = session_on(Box::new(store.clone()));
        session.draw_booster(1_000).await.expect("booster");
        let first = session.zones().cards(ZoneName::Collection)[0].id.clone();
        session
            .move_card(ZoneName::Collection, ZoneName::Hand, &first)
            .expect("to hand");
    }
    assert!(store.get(BACKUP_KEY).unwrap().is_some());
    let mut writer = store.clone();
    writer.set(SESSION_KEY, "{\"deck\": [").unwrap();

    let resumed = session_on(Box::new(store.clone()));
    assert_eq!(resumed.zones().cards(ZoneName::Collection).len(), 5);
    assert!(resumed.zones().cards(ZoneName::Hand).is_empty());
}

#[tokio::test]
async fn primary_without_draw_time_is_rejected() {
    let store = MemoryStore::new();
    {
        let mut session = session_on(Box::new(store.clone()));
        session.draw_booster(1_000).await.expect("booster");
        session.shuffle_deck();
    }
    let mut writer = store.clone();
    let raw = store.get(SESSION_KEY).unwrap().expect("saved");
    let mut doc: Value = serde_json::from_str(&raw).unwrap();
    doc.as_object_mut().unwrap().remove("lastDrawTime");
    writer.set(SESSION_KEY, &doc.to_string()).unwrap();

    let resumed = session_on(Box::new(store.clone()));
    assert_eq!(resumed.cooldown().last_draw_ms(), Some(1_000));
}

#[test]
fn unusable_saves_give_a_fresh_session() {
    let mut store = MemoryStore::new();
    store.set(SESSION_KEY, "[]").unwrap();
    store
        .set(BACKUP_KEY, "{\"deck\": {}, \"hand\": [], \"discard\": []}")
        .unwrap();
    let session = session_on(Box::new(store));
    assert!(session.zones().cards(ZoneName::Collection).is_empty());
    assert_eq!(session.phase(), BattlePhase::Idle);
    assert_eq!(session.ledger().games_played, 0);
}

#[tokio::test]
async fn storage_failures_do_not_stop_the_game() {
    let mut session = session_on(Box::new(BrokenStore));
    session.draw_booster(0).await.expect("booster still works");
    assert_eq!(session.zones().cards(ZoneName::Collection).len(), 5);
    session.enter_battle().await.expect("battle still works");
}
