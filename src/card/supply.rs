//! The card supply: where new card records come from.
//!
//! Every caller goes through [`draw_with_fallback`], which never fails: a
//! supply error or a short batch is topped up with synthetic cards.

use super::catalog::TEMPLATES;
use super::{Card, RawCard, Stat};
use rand::{Rng, RngCore, SeedableRng};
use rand_pcg::Lcg64Xsh32;
use rocket::futures::future::BoxFuture;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupplyError {
    Unavailable(String),
    Empty,
}

impl fmt::Display for SupplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupplyError::Unavailable(reason) => write!(f, "card supply unavailable: {}", reason),
            SupplyError::Empty => write!(f, "card supply returned no cards"),
        }
    }
}

impl std::error::Error for SupplyError {}

/// Source of pseudo-random card records. `seed` comes from the session RNG;
/// a supply that is random at all should derive its choices from it.
pub trait CardSupply: Send + Sync {
    fn draw_random(
        &self,
        count: usize,
        seed: u64,
    ) -> BoxFuture<'_, Result<Vec<RawCard>, SupplyError>>;
}

/// Offline supply drawing from the built-in template catalog.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogSupply;

impl CatalogSupply {
    pub fn new() -> Self {
        CatalogSupply
    }

    fn pick(&self, count: usize, seed: u64) -> Vec<RawCard> {
        let mut rng = Lcg64Xsh32::seed_from_u64(seed);
        (0..count)
            .map(|_| {
                let (name, card_type, hp) = TEMPLATES[rng.gen_range(0..TEMPLATES.len())];
                RawCard {
                    id: format!("local-{:016x}", rng.next_u64()),
                    name: name.to_string(),
                    types: Some(vec![card_type.to_string()]),
                    hp: Some(Stat::Number(hp)),
                    ..Default::default()
                }
            })
            .collect()
    }
}

impl CardSupply for CatalogSupply {
    fn draw_random(
        &self,
        count: usize,
        seed: u64,
    ) -> BoxFuture<'_, Result<Vec<RawCard>, SupplyError>> {
        let cards = self.pick(count, seed);
        Box::pin(async move {
            if cards.is_empty() && count > 0 {
                return Err(SupplyError::Empty);
            }
            Ok(cards)
        })
    }
}

/// Generate `count` cards with plausible stats: hp 50..=200, attack 60..=180.
pub fn synthetic_cards(count: usize, rng: &mut Lcg64Xsh32) -> Vec<Card> {
    (0..count)
        .map(|i| {
            let mut card = Card::new(
                format!("synthetic-{:016x}", rng.next_u64()),
                format!("Wild Pokémon {}", i + 1),
                rng.gen_range(50..=200),
                rng.gen_range(60..=180),
            );
            card.types = vec!["Normal".to_string()];
            card
        })
        .collect()
}

/// Draw `count` cards from `supply`, substituting synthetic cards for
/// whatever the supply could not provide.
pub async fn draw_with_fallback(
    supply: &dyn CardSupply,
    count: usize,
    rng: &mut Lcg64Xsh32,
) -> Vec<Card> {
    if count == 0 {
        return Vec::new();
    }
    let seed = rng.next_u64();
    match supply.draw_random(count, seed).await {
        Ok(raw) => {
            let mut cards: Vec<Card> = raw
                .into_iter()
                .take(count)
                .map(|r| r.ingest(&mut *rng))
                .collect();
            if cards.len() < count {
                log::warn!(
                    "card supply returned {} of {} cards, padding with synthetic cards",
                    cards.len(),
                    count
                );
                let missing = count - cards.len();
                cards.extend(synthetic_cards(missing, rng));
            }
            cards
        }
        Err(e) => {
            log::warn!("{}; generating {} synthetic cards", e, count);
            synthetic_cards(count, rng)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenSupply;

    impl CardSupply for BrokenSupply {
        fn draw_random(
            &self,
            _count: usize,
            _seed: u64,
        ) -> BoxFuture<'_, Result<Vec<RawCard>, SupplyError>> {
            Box::pin(async { Err(SupplyError::Unavailable("offline".to_string())) })
        }
    }

    struct StingySupply;

    impl CardSupply for StingySupply {
        fn draw_random(
            &self,
            _count: usize,
            _seed: u64,
        ) -> BoxFuture<'_, Result<Vec<RawCard>, SupplyError>> {
            Box::pin(async {
                Ok(vec![RawCard {
                    id: "only-one".to_string(),
                    name: "Ditto".to_string(),
                    ..Default::default()
                }])
            })
        }
    }

    #[test]
    fn synthetic_cards_have_plausible_stats() {
        let mut rng = Lcg64Xsh32::seed_from_u64(3);
        let cards = synthetic_cards(50, &mut rng);
        assert_eq!(cards.len(), 50);
        for c in &cards {
            assert!((50..=200).contains(&c.hp.value()));
            assert!((60..=180).contains(&c.attack.value()));
        }
        let mut ids: Vec<&str> = cards.iter().map(|c| c.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 50);
    }

    #[tokio::test]
    async fn failing_supply_degrades_to_synthetic() {
        let mut rng = Lcg64Xsh32::seed_from_u64(1);
        let cards = draw_with_fallback(&BrokenSupply, 5, &mut rng).await;
        assert_eq!(cards.len(), 5);
        assert!(cards.iter().all(|c| c.id.starts_with("synthetic-")));
    }

    #[tokio::test]
    async fn short_batch_is_padded() {
        let mut rng = Lcg64Xsh32::seed_from_u64(1);
        let cards = draw_with_fallback(&StingySupply, 3, &mut rng).await;
        assert_eq!(cards.len(), 3);
        assert_eq!(cards[0].id, "only-one");
    }

    #[tokio::test]
    async fn catalog_supply_draws_requested_count() {
        let supply = CatalogSupply::new();
        let raw = supply.draw_random(5, 9).await.expect("catalog never fails");
        assert_eq!(raw.len(), 5);
        assert!(raw.iter().all(|r| r.id.starts_with("local-")));
    }

    #[tokio::test]
    async fn same_rng_state_draws_same_cards() {
        let mut a = Lcg64Xsh32::seed_from_u64(42);
        let mut b = Lcg64Xsh32::seed_from_u64(42);
        let first = draw_with_fallback(&CatalogSupply::new(), 5, &mut a).await;
        let second = draw_with_fallback(&CatalogSupply::new(), 5, &mut b).await;
        assert_eq!(first, second);

        let offline_a = draw_with_fallback(&BrokenSupply, 3, &mut a).await;
        let offline_b = draw_with_fallback(&BrokenSupply, 3, &mut b).await;
        assert_eq!(offline_a, offline_b);
    }
}
