use either::{Either, Left, Right};
use rocket::response::status::{BadRequest, NotFound};
use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};
use rocket::State;
use rocket_okapi::{openapi, JsonSchema};
use std::sync::Arc;

use crate::service::GameService;
use crate::session::events::EventEntry;
use crate::session::ExitPolicy;
use crate::status_messages::{new_status, Status};
use crate::zones::ZoneName;

/// Everything a client can ask the session to do.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema, Hash)]
#[serde(crate = "rocket::serde", tag = "action_type")]
pub enum SessionAction {
    MoveCard {
        from: ZoneName,
        to: ZoneName,
        card_id: String,
    },
    ShuffleDeck,
    ClearZone {
        zone: ZoneName,
    },
    DrawBooster,
    EnterBattle,
    ResolveBattle,
    Replay,
    ExitBattle {
        policy: ExitPolicy,
    },
    MoveOpponentCard {
        from: ZoneName,
        to: ZoneName,
        card_id: String,
    },
    NewGame,
    SetSeed {
        seed: u64,
    },
}

impl SessionAction {
    /// Whether the action may call the card supply.
    pub fn uses_supply(&self) -> bool {
        matches!(
            self,
            SessionAction::DrawBooster | SessionAction::EnterBattle | SessionAction::Replay
        )
    }
}

#[openapi]
#[post("/action", format = "json", data = "<session_action>")]
pub async fn play(
    game: &State<Arc<GameService>>,
    session_action: Json<SessionAction>,
) -> Result<(rocket::http::Status, Json<EventEntry>), Either<NotFound<Json<Status>>, BadRequest<Json<Status>>>>
{
    match game.perform(session_action.0).await {
        Ok(entry) => Ok((rocket::http::Status::Created, Json(entry))),
        Err(e) if e.is_not_found() => Err(Left(NotFound(new_status(e.to_string())))),
        Err(e) => Err(Right(BadRequest(new_status(e.to_string())))),
    }
}
