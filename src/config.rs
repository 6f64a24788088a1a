//! Runtime configuration, read from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `POKEMON_TCG_COOLDOWN_SECS` | 300 |
//! | `POKEMON_TCG_DATA_DIR` | unset: in-memory storage |
//! | `POKEMON_TCG_SEED` | unset: seeded from entropy; a resumed save keeps its own RNG state |
//! | `POKEMON_TCG_OPPONENT_STOCK` | 5 |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::cooldown::DEFAULT_COOLDOWN;

pub const COOLDOWN_VAR: &str = "POKEMON_TCG_COOLDOWN_SECS";
pub const DATA_DIR_VAR: &str = "POKEMON_TCG_DATA_DIR";
pub const SEED_VAR: &str = "POKEMON_TCG_SEED";
pub const OPPONENT_STOCK_VAR: &str = "POKEMON_TCG_OPPONENT_STOCK";

pub const DEFAULT_OPPONENT_STOCK: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    pub cooldown: Duration,
    pub data_dir: Option<PathBuf>,
    pub seed: Option<u64>,
    /// Cards added to the opponent deck with every booster.
    pub opponent_stock: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            cooldown: DEFAULT_COOLDOWN,
            data_dir: None,
            seed: None,
            opponent_stock: DEFAULT_OPPONENT_STOCK,
        }
    }
}

impl GameConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = GameConfig::default();
        GameConfig {
            cooldown: parse_var::<u64, _>(&lookup, COOLDOWN_VAR)
                .map(Duration::from_secs)
                .unwrap_or(defaults.cooldown),
            data_dir: lookup(DATA_DIR_VAR)
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            seed: parse_var(&lookup, SEED_VAR),
            opponent_stock: parse_var(&lookup, OPPONENT_STOCK_VAR)
                .unwrap_or(defaults.opponent_stock),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("ignoring {}={:?}: not a valid number", key, raw);
            None
        }
    }
}
