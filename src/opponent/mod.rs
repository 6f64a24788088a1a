//! The simulated opponent: its own deck, hand and discard, and a random
//! card-selection policy.
//!
//! Selecting a battle card does not take it out of the hand. The battle slot
//! holds a copy of a hand card; the card leaves the hand only when
//! [`Opponent::discard_battle_card`] moves it to the discard pile.

use rand::Rng;
use rand_pcg::Lcg64Xsh32;
use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

use crate::card::{draw_with_fallback, Card, CardSupply};
use crate::zones::{MoveError, ZoneName, HAND_LIMIT};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct Opponent {
    pub(crate) deck: Vec<Card>,
    pub(crate) hand: Vec<Card>,
    pub(crate) discard: Vec<Card>,
    pub(crate) battle_slot: Option<Card>,
}

impl Opponent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deck(&self) -> &[Card] {
        &self.deck
    }

    pub fn hand(&self) -> &[Card] {
        &self.hand
    }

    pub fn discard(&self) -> &[Card] {
        &self.discard
    }

    pub fn battle_card(&self) -> Option<&Card> {
        self.battle_slot.as_ref()
    }

    /// Append `count` fresh cards to the deck, then top the hand up from it.
    /// Returns the number of cards added.
    pub async fn stock_deck(
        &mut self,
        count: usize,
        supply: &dyn CardSupply,
        rng: &mut Lcg64Xsh32,
    ) -> usize {
        let cards = draw_with_fallback(supply, count, rng).await;
        let added = cards.len();
        self.deck.extend(cards);
        self.refill_hand_from_deck();
        log::debug!(
            "opponent deck stocked with {} cards, deck now {}",
            added,
            self.deck.len()
        );
        added
    }

    /// Deal an opening hand straight from the supply, bypassing the deck.
    pub async fn init_hand(&mut self, supply: &dyn CardSupply, rng: &mut Lcg64Xsh32) {
        let missing = HAND_LIMIT.saturating_sub(self.hand.len());
        let cards = draw_with_fallback(supply, missing, rng).await;
        self.hand.extend(cards);
    }

    /// Move cards from the front of the deck into the hand until the hand is
    /// full or the deck is empty. Returns how many cards were drawn.
    pub fn refill_hand_from_deck(&mut self) -> usize {
        let mut drawn = 0;
        while self.hand.len() < HAND_LIMIT && !self.deck.is_empty() {
            let card = self.deck.remove(0);
            self.hand.push(card);
            drawn += 1;
        }
        drawn
    }

    /// Pick a uniformly random hand card for the battle slot, restocking
    /// first if both hand and deck are empty. The card stays in the hand.
    pub async fn choose_battle_card(
        &mut self,
        supply: &dyn CardSupply,
        rng: &mut Lcg64Xsh32,
    ) -> Option<Card> {
        if self.hand.is_empty() {
            self.refill_hand_from_deck();
        }
        if self.hand.is_empty() {
            log::info!("opponent out of cards, restocking deck");
            self.stock_deck(HAND_LIMIT, supply, rng).await;
        }
        self.pick_from_hand(rng)
    }

    /// Select a random card already in hand, without touching deck or supply.
    pub fn pick_from_hand(&mut self, rng: &mut Lcg64Xsh32) -> Option<Card> {
        if self.hand.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..self.hand.len());
        let chosen = self.hand.get(index).cloned();
        self.battle_slot = chosen.clone();
        chosen
    }

    /// Move the selected battle card from the hand to the discard pile and
    /// refill the hand. Returns the discarded card.
    pub fn discard_battle_card(&mut self) -> Option<Card> {
        let card = self.battle_slot.take()?;
        if let Some(index) = self.hand.iter().position(|c| c.id == card.id) {
            self.hand.remove(index);
        }
        self.discard.push(card.clone());
        self.refill_hand_from_deck();
        Some(card)
    }

    pub fn clear_battle_slot(&mut self) -> Option<Card> {
        self.battle_slot.take()
    }

    /// User-driven move among the opponent's hand, battle slot and discard.
    /// The opponent deck is never directly reachable.
    pub fn move_card(
        &mut self,
        from: ZoneName,
        to: ZoneName,
        card_id: &str,
    ) -> Result<Card, MoveError> {
        use ZoneName::*;
        let not_found = |zone| MoveError::CardNotFound {
            zone,
            card_id: card_id.to_string(),
        };
        match (from, to) {
            (Hand, BattleSlot) => {
                let card = self
                    .hand
                    .iter()
                    .find(|c| c.id == card_id)
                    .cloned()
                    .ok_or_else(|| not_found(Hand))?;
                self.battle_slot = Some(card.clone());
                Ok(card)
            }
            (BattleSlot, Hand) => {
                if !self.slot_holds(card_id) {
                    return Err(not_found(BattleSlot));
                }
                let in_hand = self.hand.iter().any(|h| h.id == card_id);
                if !in_hand && self.hand.len() >= HAND_LIMIT {
                    return Err(MoveError::HandFull { limit: HAND_LIMIT });
                }
                let card = self
                    .battle_slot
                    .take()
                    .ok_or_else(|| not_found(BattleSlot))?;
                if !in_hand {
                    self.hand.push(card.clone());
                }
                Ok(card)
            }
            (BattleSlot, Discard) => {
                if !self.slot_holds(card_id) {
                    return Err(not_found(BattleSlot));
                }
                self.discard_battle_card()
                    .ok_or_else(|| not_found(BattleSlot))
            }
            (Hand, Discard) => {
                let index = self
                    .hand
                    .iter()
                    .position(|c| c.id == card_id)
                    .ok_or_else(|| not_found(Hand))?;
                let card = self.hand.remove(index);
                if self.slot_holds(card_id) {
                    self.battle_slot = None;
                }
                self.discard.push(card.clone());
                self.refill_hand_from_deck();
                Ok(card)
            }
            (Discard, Hand) => {
                let index = self
                    .discard
                    .iter()
                    .position(|c| c.id == card_id)
                    .ok_or_else(|| not_found(Discard))?;
                if self.hand.len() >= HAND_LIMIT {
                    return Err(MoveError::HandFull { limit: HAND_LIMIT });
                }
                let card = self.discard.remove(index);
                self.hand.push(card.clone());
                Ok(card)
            }
            _ => Err(MoveError::IllegalMove { from, to }),
        }
    }

    fn slot_holds(&self, card_id: &str) -> bool {
        self.battle_slot.as_ref().map(|c| c.id.as_str()) == Some(card_id)
    }

    pub fn reset(&mut self) {
        *self = Opponent::default();
    }

    pub fn check_invariants(&self) -> Result<(), String> {
        if self.hand.len() > HAND_LIMIT {
            return Err(format!("opponent hand holds {} cards", self.hand.len()));
        }
        if let Some(card) = &self.battle_slot {
            if !self.hand.iter().any(|c| c.id == card.id) {
                return Err(format!("opponent battle card {} is not in hand", card.id));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CatalogSupply;
    use rand::SeedableRng;

    fn cards(prefix: &str, n: usize) -> Vec<Card> {
        (0..n)
            .map(|i| Card::new(format!("{}{}", prefix, i), "Rattata", 30, 20))
            .collect()
    }

    #[test]
    fn refill_draws_from_deck_front() {
        let mut opp = Opponent::new();
        opp.deck = cards("d", 7);
        opp.hand = cards("h", 2);
        assert_eq!(opp.refill_hand_from_deck(), 3);
        let hand: Vec<&str> = opp.hand.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(hand, vec!["h0", "h1", "d0", "d1", "d2"]);
        assert_eq!(opp.deck.len(), 4);
    }

    #[tokio::test]
    async fn stock_deck_is_additive() {
        let supply = CatalogSupply::new();
        let mut rng = Lcg64Xsh32::seed_from_u64(4);
        let mut opp = Opponent::new();
        opp.stock_deck(5, &supply, &mut rng).await;
        opp.stock_deck(5, &supply, &mut rng).await;
        assert_eq!(opp.hand.len(), 5);
        assert_eq!(opp.deck.len(), 5);
    }

    #[tokio::test]
    async fn selection_keeps_card_in_hand_until_discard() {
        let supply = CatalogSupply::new();
        let mut rng = Lcg64Xsh32::seed_from_u64(1);
        let mut opp = Opponent::new();
        opp.hand = cards("h", 3);
        opp.deck = cards("d", 1);
        let chosen = opp.choose_battle_card(&supply, &mut rng).await.unwrap();
        assert_eq!(opp.hand.len(), 3);
        assert!(opp.hand.iter().any(|c| c.id == chosen.id));
        opp.check_invariants().unwrap();

        let discarded = opp.discard_battle_card().unwrap();
        assert_eq!(discarded.id, chosen.id);
        assert!(opp.hand.iter().all(|c| c.id != chosen.id));
        // refilled from the deck
        assert_eq!(opp.hand.len(), 3);
        assert!(opp.deck.is_empty());
        assert_eq!(opp.discard.len(), 1);
        assert!(opp.battle_card().is_none());
    }

    #[test]
    fn discard_to_full_hand_is_rejected() {
        let mut opp = Opponent::new();
        opp.hand = cards("h", 5);
        opp.discard = cards("x", 1);
        let before = opp.clone();
        assert_eq!(
            opp.move_card(ZoneName::Discard, ZoneName::Hand, "x0"),
            Err(MoveError::HandFull { limit: 5 })
        );
        assert_eq!(opp, before);
    }

    #[test]
    fn opponent_deck_is_not_reachable() {
        let mut opp = Opponent::new();
        opp.deck = cards("d", 1);
        assert_eq!(
            opp.move_card(ZoneName::Deck, ZoneName::Hand, "d0"),
            Err(MoveError::IllegalMove {
                from: ZoneName::Deck,
                to: ZoneName::Hand
            })
        );
    }

    #[test]
    fn hand_to_discard_clears_matching_slot() {
        let mut opp = Opponent::new();
        opp.hand = cards("h", 2);
        opp.move_card(ZoneName::Hand, ZoneName::BattleSlot, "h1").unwrap();
        opp.move_card(ZoneName::Hand, ZoneName::Discard, "h1").unwrap();
        assert!(opp.battle_card().is_none());
        assert_eq!(opp.discard.len(), 1);
        opp.check_invariants().unwrap();
    }
}
