//! The player's card zones and the rules for moving cards between them.
//!
//! Every operation checks its capacity limits before touching any sequence,
//! so a rejected move leaves all zones exactly as they were.

use rand::seq::SliceRandom;
use rand_pcg::Lcg64Xsh32;
use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;
use std::fmt;

use crate::card::Card;

/// Hard cap on the hand.
pub const HAND_LIMIT: usize = 5;
/// Cap on deck + hand combined.
pub const PLAYABLE_LIMIT: usize = 30;

/// Named player zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub enum ZoneName {
    Collection,
    Deck,
    Hand,
    Discard,
    BattleSlot,
}

impl ZoneName {
    pub fn all() -> [ZoneName; 5] {
        [
            ZoneName::Collection,
            ZoneName::Deck,
            ZoneName::Hand,
            ZoneName::Discard,
            ZoneName::BattleSlot,
        ]
    }

    /// Whether a card may go directly from `from` to `to`.
    ///
    /// The battle slot is only reachable from the hand; it can be left towards
    /// the hand or the discard.
    pub fn is_legal_move(from: ZoneName, to: ZoneName) -> bool {
        use ZoneName::*;
        match (from, to) {
            (a, b) if a == b => false,
            (Collection, Hand) | (Hand, Collection) => true,
            (Collection, Deck) | (Deck, Collection) => true,
            (Deck, Hand) | (Hand, Deck) => true,
            (Hand, BattleSlot) | (BattleSlot, Hand) => true,
            (BattleSlot, Discard) => true,
            (_, BattleSlot) | (BattleSlot, _) => false,
            (_, Discard) | (Discard, _) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ZoneName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ZoneName::Collection => "collection",
            ZoneName::Deck => "deck",
            ZoneName::Hand => "hand",
            ZoneName::Discard => "discard",
            ZoneName::BattleSlot => "battle slot",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    IllegalMove { from: ZoneName, to: ZoneName },
    CardNotFound { zone: ZoneName, card_id: String },
    /// Deck + hand would exceed `PLAYABLE_LIMIT`.
    PlayableLimit { limit: usize },
    /// The hand is full and cannot rotate.
    HandFull { limit: usize },
    DuplicateCard { card_id: String },
    NotClearable(ZoneName),
}

impl fmt::Display for MoveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveError::IllegalMove { from, to } => {
                write!(f, "Cannot move a card from {} to {}", from, to)
            }
            MoveError::CardNotFound { zone, card_id } => {
                write!(f, "Card {} not found in {}", card_id, zone)
            }
            MoveError::PlayableLimit { limit } => {
                write!(f, "Deck and hand together cannot hold more than {} cards", limit)
            }
            MoveError::HandFull { limit } => write!(f, "Hand already holds {} cards", limit),
            MoveError::DuplicateCard { card_id } => {
                write!(f, "Card {} is already in play", card_id)
            }
            MoveError::NotClearable(zone) => write!(f, "The {} cannot be cleared", zone),
        }
    }
}

impl std::error::Error for MoveError {}

/// Outcome of a successful move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct MoveReport {
    pub card: Card,
    /// Card pushed out by the move: the oldest hand card on rotation, or the
    /// previous battle-slot card when the slot was occupied.
    pub displaced: Option<Card>,
}

/// Deck, hand and discard as they stood when a battle started.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct ZoneSnapshot {
    pub deck: Vec<Card>,
    pub hand: Vec<Card>,
    pub discard: Vec<Card>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct ZoneStore {
    pub(crate) collection: Vec<Card>,
    pub(crate) deck: Vec<Card>,
    pub(crate) hand: Vec<Card>,
    pub(crate) discard: Vec<Card>,
    pub(crate) battle_slot: Option<Card>,
}

impl ZoneStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cards(&self, zone: ZoneName) -> &[Card] {
        match zone {
            ZoneName::Collection => &self.collection,
            ZoneName::Deck => &self.deck,
            ZoneName::Hand => &self.hand,
            ZoneName::Discard => &self.discard,
            ZoneName::BattleSlot => self.battle_slot.as_slice(),
        }
    }

    pub fn battle_card(&self) -> Option<&Card> {
        self.battle_slot.as_ref()
    }

    /// Deck + hand.
    pub fn playable_count(&self) -> usize {
        self.deck.len() + self.hand.len()
    }

    /// Zone currently holding `card_id`, if any.
    pub fn locate(&self, card_id: &str) -> Option<ZoneName> {
        ZoneName::all()
            .into_iter()
            .find(|z| self.cards(*z).iter().any(|c| c.id == card_id))
    }

    fn sequence_mut(&mut self, zone: ZoneName) -> Option<&mut Vec<Card>> {
        match zone {
            ZoneName::Collection => Some(&mut self.collection),
            ZoneName::Deck => Some(&mut self.deck),
            ZoneName::Hand => Some(&mut self.hand),
            ZoneName::Discard => Some(&mut self.discard),
            ZoneName::BattleSlot => None,
        }
    }

    fn position(&self, zone: ZoneName, card_id: &str) -> Option<usize> {
        self.cards(zone).iter().position(|c| c.id == card_id)
    }

    fn take(&mut self, zone: ZoneName, index: usize) -> Option<Card> {
        match self.sequence_mut(zone) {
            Some(seq) if index < seq.len() => Some(seq.remove(index)),
            Some(_) => None,
            None => self.battle_slot.take(),
        }
    }

    /// Append cards to the collection. Ids are assumed unique already.
    pub fn add_to_collection(&mut self, cards: Vec<Card>) {
        self.collection.extend(cards);
    }

    /// Move `card_id` from `from` to `to`.
    ///
    /// Hand-bound moves into a full hand rotate the oldest hand card to the
    /// back of the deck instead of failing. Moves that add a card to the deck
    /// or hand from outside that pair must keep deck + hand within
    /// `PLAYABLE_LIMIT`.
    pub fn move_card(
        &mut self,
        from: ZoneName,
        to: ZoneName,
        card_id: &str,
    ) -> Result<MoveReport, MoveError> {
        if !ZoneName::is_legal_move(from, to) {
            return Err(MoveError::IllegalMove { from, to });
        }
        let not_found = || MoveError::CardNotFound {
            zone: from,
            card_id: card_id.to_string(),
        };
        let index = self.position(from, card_id).ok_or_else(not_found)?;

        let internal = matches!(
            (from, to),
            (ZoneName::Deck, ZoneName::Hand) | (ZoneName::Hand, ZoneName::Deck)
        );
        let enters_playable = matches!(to, ZoneName::Deck | ZoneName::Hand) && !internal;
        if enters_playable && self.playable_count() + 1 > PLAYABLE_LIMIT {
            return Err(MoveError::PlayableLimit {
                limit: PLAYABLE_LIMIT,
            });
        }

        let card = self.take(from, index).ok_or_else(not_found)?;
        let displaced = match to {
            ZoneName::Hand => self.push_to_hand_rotating(card.clone()),
            ZoneName::BattleSlot => {
                let previous = self.battle_slot.replace(card.clone());
                if let Some(prev) = &previous {
                    self.hand.push(prev.clone());
                }
                previous
            }
            other => {
                if let Some(seq) = self.sequence_mut(other) {
                    seq.push(card.clone());
                }
                None
            }
        };
        Ok(MoveReport { card, displaced })
    }

    /// Put a card that is not yet in deck or hand into the hand, rotating the
    /// oldest hand card into the deck when the hand is full. Rejected, with
    /// nothing changed, if deck + hand would exceed `PLAYABLE_LIMIT`.
    pub fn move_to_hand_with_rotation(&mut self, card: Card) -> Result<Option<Card>, MoveError> {
        if self.locate(&card.id).is_some() {
            return Err(MoveError::DuplicateCard { card_id: card.id });
        }
        if self.playable_count() + 1 > PLAYABLE_LIMIT {
            return Err(MoveError::PlayableLimit {
                limit: PLAYABLE_LIMIT,
            });
        }
        Ok(self.push_to_hand_rotating(card))
    }

    fn push_to_hand_rotating(&mut self, card: Card) -> Option<Card> {
        let displaced = if self.hand.len() >= HAND_LIMIT {
            let oldest = self.hand.remove(0);
            self.deck.push(oldest.clone());
            Some(oldest)
        } else {
            None
        };
        self.hand.push(card);
        displaced
    }

    /// Move every card of `zone` into the collection. Returns how many moved.
    pub fn clear_zone_to_collection(&mut self, zone: ZoneName) -> Result<usize, MoveError> {
        let drained: Vec<Card> = match zone {
            ZoneName::Collection => return Err(MoveError::NotClearable(zone)),
            ZoneName::BattleSlot => self.battle_slot.take().into_iter().collect(),
            ZoneName::Deck => std::mem::take(&mut self.deck),
            ZoneName::Hand => std::mem::take(&mut self.hand),
            ZoneName::Discard => std::mem::take(&mut self.discard),
        };
        let moved = drained.len();
        self.collection.extend(drained);
        Ok(moved)
    }

    /// Fold deck, hand, discard and battle slot back into the collection.
    pub fn fold_into_collection(&mut self) -> usize {
        [
            ZoneName::Deck,
            ZoneName::Hand,
            ZoneName::Discard,
            ZoneName::BattleSlot,
        ]
        .into_iter()
        .filter_map(|z| self.clear_zone_to_collection(z).ok())
        .sum()
    }

    /// Uniform in-place shuffle (Fisher-Yates) of one zone.
    pub fn shuffle(&mut self, zone: ZoneName, rng: &mut Lcg64Xsh32) {
        if let Some(seq) = self.sequence_mut(zone) {
            seq.shuffle(rng);
        }
    }

    pub fn snapshot_battle_zones(&self) -> ZoneSnapshot {
        ZoneSnapshot {
            deck: self.deck.clone(),
            hand: self.hand.clone(),
            discard: self.discard.clone(),
        }
    }

    /// Put deck, hand and discard back as captured; the battle slot is emptied.
    pub fn restore_battle_zones(&mut self, snapshot: ZoneSnapshot) {
        self.deck = snapshot.deck;
        self.hand = snapshot.hand;
        self.discard = snapshot.discard;
        self.battle_slot = None;
    }

    /// Check the zone invariants: hand cap, deck + hand cap, and that no card
    /// id appears twice across the player's zones.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.hand.len() > HAND_LIMIT {
            return Err(format!("hand holds {} cards", self.hand.len()));
        }
        if self.playable_count() > PLAYABLE_LIMIT {
            return Err(format!("deck + hand hold {} cards", self.playable_count()));
        }
        let mut ids: Vec<&str> = ZoneName::all()
            .into_iter()
            .flat_map(|z| self.cards(z).iter().map(|c| c.id.as_str()))
            .collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        if ids.len() != total {
            return Err("a card id appears in more than one place".to_string());
        }
        Ok(())
    }
}
