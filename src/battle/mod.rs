//! Battle resolution: a pure comparison of two cards' scores.
//!
//! `score = attack + hp`, non-numeric stats counting as 0. The higher score
//! wins; equal scores draw. No randomness and no side effects, so the same
//! pair always resolves the same way.

use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;
use std::fmt;

use crate::card::Card;

pub mod ledger;

pub use ledger::MatchLedger;

/// Battle outcome from the player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Loss,
    Draw,
}

impl Outcome {
    /// The same battle seen from the other side.
    pub fn reversed(self) -> Outcome {
        match self {
            Outcome::Win => Outcome::Loss,
            Outcome::Loss => Outcome::Win,
            Outcome::Draw => Outcome::Draw,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Player,
    Opponent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BattleError {
    MissingCard(Side),
}

impl fmt::Display for BattleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BattleError::MissingCard(Side::Player) => {
                write!(f, "The player's battle slot is empty")
            }
            BattleError::MissingCard(Side::Opponent) => {
                write!(f, "The opponent's battle slot is empty")
            }
        }
    }
}

impl std::error::Error for BattleError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct BattleResult {
    pub outcome: Outcome,
    pub player_score: i64,
    pub opponent_score: i64,
}

pub fn resolve(
    player_card: Option<&Card>,
    opponent_card: Option<&Card>,
) -> Result<BattleResult, BattleError> {
    let player = player_card.ok_or(BattleError::MissingCard(Side::Player))?;
    let opponent = opponent_card.ok_or(BattleError::MissingCard(Side::Opponent))?;
    let player_score = player.score();
    let opponent_score = opponent.score();
    let outcome = match player_score.cmp(&opponent_score) {
        std::cmp::Ordering::Greater => Outcome::Win,
        std::cmp::Ordering::Less => Outcome::Loss,
        std::cmp::Ordering::Equal => Outcome::Draw,
    };
    Ok(BattleResult {
        outcome,
        player_score,
        opponent_score,
    })
}
