//! # Pokémon TCG battle core
//!
//! Card zones, a simulated opponent and single-card battles for a
//! collectible card game, served as a JSON API.
//!
//! ## Overview
//!
//! The player owns a collection, a deck, a hand (at most 5 cards), a discard
//! pile and a battle slot; deck and hand together hold at most 30 cards. A
//! battle puts one player card against one card picked at random by the
//! opponent, and the higher `attack + hp` wins. New cards arrive in boosters
//! of 5, gated by a cooldown.
//!
//! ## Architecture
//!
//! All game state lives in one [`session::Session`], shared between requests
//! through [`service::GameService`]. Clients mutate it with `POST /action`
//! and read it through the GET views; OpenAPI docs are served at `/swagger`.
//! Every mutation is written through to a key-value store so a restarted
//! server resumes where it left off.

// Rocket makes this a bit tricky to support
#![allow(clippy::module_name_repetitions)]
#[macro_use]
extern crate rocket;

use rocket_okapi::openapi_get_routes;
use rocket_okapi::swagger_ui::{make_swagger_ui, SwaggerUIConfig};
use std::sync::Arc;

pub mod action;
pub mod battle;
pub mod card;
pub mod config;
pub mod cooldown;
pub mod opponent;
pub mod service;
pub mod session;
pub mod status_messages;
pub mod zones;

use crate::config::GameConfig;
use crate::service::GameService;

/// Initializes the Rocket web server from the environment configuration.
///
/// # Example
///
/// ```no_run
/// use pokemon_tcg_battle::rocket_initialize;
///
/// #[rocket::main]
/// async fn main() {
///     rocket_initialize().launch().await.expect("Failed to launch rocket");
/// }
/// ```
pub fn rocket_initialize() -> rocket::Rocket<rocket::Build> {
    #[allow(clippy::no_effect_underscore_binding)]
    let _ = env_logger::try_init();

    let config = GameConfig::from_env();
    log::info!(
        "starting with a {}s booster cooldown",
        config.cooldown.as_secs()
    );
    rocket_build(Arc::new(GameService::from_config(&config)))
}

/// Mount every route around an already built service.
pub fn rocket_build(game: Arc<GameService>) -> rocket::Rocket<rocket::Build> {
    use crate::action::okapi_add_operation_for_play_;
    use crate::action::play;
    use crate::session::endpoints::okapi_add_operation_for_get_cooldown_;
    use crate::session::endpoints::okapi_add_operation_for_get_ledger_;
    use crate::session::endpoints::okapi_add_operation_for_get_opponent_;
    use crate::session::endpoints::okapi_add_operation_for_get_session_;
    use crate::session::endpoints::okapi_add_operation_for_get_stats_;
    use crate::session::endpoints::okapi_add_operation_for_list_events_;
    use crate::session::endpoints::{
        get_cooldown, get_ledger, get_opponent, get_session, get_stats, list_events,
    };

    rocket::build()
        .mount(
            "/",
            openapi_get_routes![
                play,
                get_session,
                get_stats,
                get_cooldown,
                get_ledger,
                get_opponent,
                list_events
            ],
        )
        .mount("/swagger", make_swagger_ui(&get_docs()))
        .manage(game)
}

fn get_docs() -> SwaggerUIConfig {
    SwaggerUIConfig {
        url: "/openapi.json".to_string(),
        ..Default::default()
    }
}
