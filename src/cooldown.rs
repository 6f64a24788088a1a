//! Booster cooldown. `can_draw` and `time_left` are pure functions of the
//! caller-supplied clock and the last draw timestamp; nothing ticks.

use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(300);

/// Milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub enum CooldownState {
    Ready,
    Cooling,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CooldownGate {
    last_draw_ms: Option<u64>,
    duration: Duration,
}

impl Default for CooldownGate {
    fn default() -> Self {
        CooldownGate::new(DEFAULT_COOLDOWN)
    }
}

impl CooldownGate {
    pub fn new(duration: Duration) -> Self {
        CooldownGate {
            last_draw_ms: None,
            duration,
        }
    }

    pub fn with_last_draw(duration: Duration, last_draw_ms: Option<u64>) -> Self {
        CooldownGate {
            last_draw_ms,
            duration,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn last_draw_ms(&self) -> Option<u64> {
        self.last_draw_ms
    }

    pub fn can_draw(&self, now_ms: u64) -> bool {
        self.time_left_ms(now_ms) == 0
    }

    pub fn state(&self, now_ms: u64) -> CooldownState {
        if self.can_draw(now_ms) {
            CooldownState::Ready
        } else {
            CooldownState::Cooling
        }
    }

    /// `max(0, duration - (now - last_draw))`, or 0 if never drawn. A clock
    /// that went backwards counts as no time elapsed.
    pub fn time_left_ms(&self, now_ms: u64) -> u64 {
        match self.last_draw_ms {
            None => 0,
            Some(last) => {
                let elapsed = now_ms.saturating_sub(last);
                (self.duration.as_millis() as u64).saturating_sub(elapsed)
            }
        }
    }

    /// READY -> COOLING.
    pub fn record_draw(&mut self, now_ms: u64) {
        self.last_draw_ms = Some(now_ms);
    }

    pub fn reset(&mut self) {
        self.last_draw_ms = None;
    }
}

/// Render milliseconds as `m:ss`, rounding partial seconds down.
pub fn format_time_left(ms: u64) -> String {
    let minutes = ms / 60_000;
    let seconds = (ms % 60_000) / 1000;
    format!("{}:{:02}", minutes, seconds)
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct CooldownView {
    pub state: CooldownState,
    pub can_draw: bool,
    pub time_left_ms: u64,
    pub formatted: String,
    pub cooldown_secs: u64,
}

impl CooldownView {
    pub fn at(gate: &CooldownGate, now_ms: u64) -> Self {
        let left = gate.time_left_ms(now_ms);
        CooldownView {
            state: gate.state(now_ms),
            can_draw: left == 0,
            time_left_ms: left,
            formatted: format_time_left(left),
            cooldown_secs: gate.duration().as_secs(),
        }
    }
}
