use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::{openapi, JsonSchema};
use std::sync::Arc;

use super::events::EventEntry;
use super::{GameStats, SessionView};
use crate::battle::MatchLedger;
use crate::cooldown::{now_ms, CooldownView};
use crate::opponent::Opponent;
use crate::service::GameService;

/// Default page size of the event feed.
const EVENT_PAGE: usize = 100;

#[derive(Debug, Clone, rocket::serde::Serialize, rocket::serde::Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct LedgerResponse {
    pub ledger: MatchLedger,
    pub win_rate: u32,
    pub match_over: bool,
}

#[derive(Debug, Clone, rocket::serde::Serialize, rocket::serde::Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct EventsResponse {
    pub entries: Vec<EventEntry>,
    pub next_seq: Option<u64>,
    pub limit: usize,
}

/// Player zones, opponent zones, ledger, cooldown and battle phase.
#[openapi]
#[get("/session")]
pub async fn get_session(game: &State<Arc<GameService>>) -> Json<SessionView> {
    Json(game.session().await.view(now_ms()))
}

#[openapi]
#[get("/session/stats")]
pub async fn get_stats(game: &State<Arc<GameService>>) -> Json<GameStats> {
    Json(game.session().await.stats(now_ms()))
}

#[openapi]
#[get("/cooldown")]
pub async fn get_cooldown(game: &State<Arc<GameService>>) -> Json<CooldownView> {
    Json(game.session().await.cooldown_view(now_ms()))
}

#[openapi]
#[get("/ledger")]
pub async fn get_ledger(game: &State<Arc<GameService>>) -> Json<LedgerResponse> {
    let session = game.session().await;
    let ledger = session.ledger().clone();
    Json(LedgerResponse {
        win_rate: ledger.win_rate(),
        match_over: ledger.match_over(),
        ledger,
    })
}

#[openapi]
#[get("/opponent")]
pub async fn get_opponent(game: &State<Arc<GameService>>) -> Json<Opponent> {
    Json(game.session().await.opponent().clone())
}

/// State-changed notifications, oldest first. Sequence numbers continue
/// across restarts, but only entries from the running process are listed.
#[openapi]
#[get("/events?<from_seq>&<limit>")]
pub async fn list_events(
    from_seq: Option<u64>,
    limit: Option<usize>,
    game: &State<Arc<GameService>>,
) -> Json<EventsResponse> {
    let session = game.session().await;
    let max = limit.unwrap_or(EVENT_PAGE);
    let mut entries = session.events().since(from_seq.unwrap_or(0), max.saturating_add(1));
    let has_more = entries.len() > max;
    entries.truncate(max);
    let next_seq = if has_more {
        entries.last().map(|e| e.seq + 1)
    } else {
        None
    };
    Json(EventsResponse {
        entries,
        next_seq,
        limit: max,
    })
}
