use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

use super::Outcome;

/// Wins or losses at which a match is over.
pub const MATCH_POINT: u32 = 10;

/// Running battle counters. `games_played` is kept incrementally and always
/// equals `wins + losses + draws`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct MatchLedger {
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub games_played: u32,
    /// Informational; survives `reset`.
    pub total_cards_drawn: u64,
}

impl MatchLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Loss => self.losses += 1,
            Outcome::Draw => self.draws += 1,
        }
        self.games_played += 1;
    }

    pub fn record_cards_drawn(&mut self, count: usize) {
        self.total_cards_drawn += count as u64;
    }

    pub fn reset(&mut self) {
        self.wins = 0;
        self.losses = 0;
        self.draws = 0;
        self.games_played = 0;
    }

    /// Percentage of games won, rounded to the nearest integer.
    pub fn win_rate(&self) -> u32 {
        if self.games_played == 0 {
            return 0;
        }
        (100.0 * f64::from(self.wins) / f64::from(self.games_played)).round() as u32
    }

    pub fn match_over(&self) -> bool {
        self.wins >= MATCH_POINT || self.losses >= MATCH_POINT
    }
}
