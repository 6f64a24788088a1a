//! Card records as handed over by the card supply.
//!
//! Cards are immutable once drawn. Uniqueness is by `id` only: two cards may
//! share a name.

use rand::Rng;
use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

pub mod catalog;
pub mod supply;

pub use supply::{draw_with_fallback, synthetic_cards, CardSupply, CatalogSupply, SupplyError};

/// Display-only sentinel for a missing stat.
pub const NOT_AVAILABLE: &str = "N/A";

/// A numeric card statistic as received from the supply: either a number or a
/// string such as `"120"` or `"N/A"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", untagged)]
pub enum Stat {
    Number(i64),
    Text(String),
}

impl Stat {
    pub fn not_available() -> Self {
        Stat::Text(NOT_AVAILABLE.to_string())
    }

    /// Integer value used for scoring. Unparseable text and the "N/A"
    /// sentinel count as 0, as do negative numbers.
    pub fn value(&self) -> i64 {
        let v = match self {
            Stat::Number(n) => *n,
            Stat::Text(s) => s.trim().parse::<i64>().unwrap_or(0),
        };
        v.max(0)
    }
}

impl Default for Stat {
    fn default() -> Self {
        Stat::not_available()
    }
}

impl From<i64> for Stat {
    fn from(n: i64) -> Self {
        Stat::Number(n)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub name: String,
    pub types: Vec<String>,
    pub hp: Stat,
    pub attack: Stat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defense: Option<Stat>,
    #[serde(default = "default_supertype")]
    pub supertype: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url_large: Option<String>,
}

fn default_supertype() -> String {
    "Pokémon".to_string()
}

impl Card {
    /// Card with only the fields the battle rules look at. Mostly useful in tests.
    pub fn new(id: impl Into<String>, name: impl Into<String>, hp: i64, attack: i64) -> Self {
        Card {
            id: id.into(),
            name: name.into(),
            types: vec!["Colorless".to_string()],
            hp: Stat::Number(hp),
            attack: Stat::Number(attack),
            defense: None,
            supertype: default_supertype(),
            image_url: None,
            image_url_large: None,
        }
    }

    /// Battle score: attack + hp, with non-numeric values counted as 0.
    /// Saturates instead of overflowing on absurd stats.
    pub fn score(&self) -> i64 {
        self.attack.value().saturating_add(self.hp.value())
    }
}

/// A card record before ingestion; every field but the id and name may be missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct RawCard {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub types: Option<Vec<String>>,
    #[serde(default)]
    pub hp: Option<Stat>,
    #[serde(default)]
    pub attack: Option<Stat>,
    #[serde(default)]
    pub defense: Option<Stat>,
    #[serde(default)]
    pub supertype: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_url_large: Option<String>,
}

impl RawCard {
    /// Normalise a raw record into a `Card`. Missing attack and defense are
    /// rolled (50..150 and 25..75), missing hp becomes "N/A".
    pub fn ingest<R: Rng + ?Sized>(self, rng: &mut R) -> Card {
        let types = match self.types {
            Some(t) if !t.is_empty() => t,
            _ => vec!["Colorless".to_string()],
        };
        Card {
            id: self.id,
            name: self.name,
            types,
            hp: self.hp.unwrap_or_default(),
            attack: self
                .attack
                .unwrap_or_else(|| Stat::Number(rng.gen_range(50..150))),
            defense: Some(
                self.defense
                    .unwrap_or_else(|| Stat::Number(rng.gen_range(25..75))),
            ),
            supertype: self.supertype.unwrap_or_else(default_supertype),
            image_url: self.image_url,
            image_url_large: self.image_url_large,
        }
    }
}
