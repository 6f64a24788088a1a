use pokemon_tcg_battle::card::Card;
use pokemon_tcg_battle::zones::{MoveError, ZoneName, ZoneStore, HAND_LIMIT, PLAYABLE_LIMIT};

fn card(id: &str) -> Card {
    Card::new(id, format!("Card {}", id), 60, 40)
}

fn ids(zones: &ZoneStore, zone: ZoneName) -> Vec<String> {
    zones.cards(zone).iter().map(|c| c.id.clone()).collect()
}

/// Collection holds `deck` deck cards d0.., `hand` hand cards h0.. and
/// `extra` loose cards x0...
fn setup(deck: usize, hand: usize, extra: usize) -> ZoneStore {
    let mut zones = ZoneStore::new();
    let mut all = Vec::new();
    all.extend((0..deck).map(|i| card(&format!("d{}", i))));
    all.extend((0..hand).map(|i| card(&format!("h{}", i))));
    all.extend((0..extra).map(|i| card(&format!("x{}", i))));
    zones.add_to_collection(all);
    for i in 0..deck {
        zones
            .move_card(ZoneName::Collection, ZoneName::Deck, &format!("d{}", i))
            .expect("deck fill");
    }
    for i in 0..hand {
        zones
            .move_card(ZoneName::Collection, ZoneName::Hand, &format!("h{}", i))
            .expect("hand fill");
    }
    zones
}

#[test]
fn full_hand_rotates_oldest_card_to_deck_end() {
    let mut zones = setup(3, 5, 1);
    let report = zones
        .move_card(ZoneName::Collection, ZoneName::Hand, "x0")
        .expect("rotation");
    assert_eq!(report.displaced.map(|c| c.id), Some("h0".to_string()));
    assert_eq!(ids(&zones, ZoneName::Hand), vec!["h1", "h2", "h3", "h4", "x0"]);
    assert_eq!(ids(&zones, ZoneName::Deck), vec!["d0", "d1", "d2", "h0"]);
}

#[test]
fn deck_to_full_hand_at_playable_cap_succeeds() {
    let mut zones = setup(25, 5, 0);
    assert_eq!(zones.playable_count(), PLAYABLE_LIMIT);
    zones
        .move_card(ZoneName::Deck, ZoneName::Hand, "d7")
        .expect("internal move at cap");
    assert_eq!(zones.cards(ZoneName::Deck).len(), 25);
    assert_eq!(ids(&zones, ZoneName::Hand), vec!["h1", "h2", "h3", "h4", "d7"]);
    assert_eq!(
        zones.cards(ZoneName::Deck).last().map(|c| c.id.as_str()),
        Some("h0")
    );
    assert_eq!(zones.playable_count(), 30);
    zones.check_invariants().expect("invariants hold");
}

#[test]
fn rotation_that_would_break_playable_cap_is_rejected() {
    let mut zones = setup(25, 5, 1);
    let before = zones.clone();
    let err = zones
        .move_card(ZoneName::Collection, ZoneName::Hand, "x0")
        .unwrap_err();
    assert_eq!(err, MoveError::PlayableLimit { limit: 30 });
    assert_eq!(zones, before);
    assert_eq!(ids(&zones, ZoneName::Hand), vec!["h0", "h1", "h2", "h3", "h4"]);
}

#[test]
fn move_to_hand_with_rotation_takes_new_cards() {
    let mut zones = setup(0, 5, 0);
    let displaced = zones
        .move_to_hand_with_rotation(card("new"))
        .expect("room in deck");
    assert_eq!(displaced.map(|c| c.id), Some("h0".to_string()));
    assert_eq!(zones.cards(ZoneName::Hand).len(), HAND_LIMIT);

    let err = zones.move_to_hand_with_rotation(card("new")).unwrap_err();
    assert_eq!(
        err,
        MoveError::DuplicateCard {
            card_id: "new".to_string()
        }
    );
}

#[test]
fn unknown_card_leaves_zones_untouched() {
    let mut zones = setup(4, 3, 2);
    let before = zones.clone();
    for (from, to) in [
        (ZoneName::Deck, ZoneName::Hand),
        (ZoneName::Collection, ZoneName::Deck),
        (ZoneName::Discard, ZoneName::Hand),
    ] {
        let err = zones.move_card(from, to, "missing").unwrap_err();
        assert!(matches!(err, MoveError::CardNotFound { .. }));
    }
    assert_eq!(zones, before);
}

#[test]
fn deck_cannot_reach_battle_slot_directly() {
    let mut zones = setup(1, 0, 0);
    assert_eq!(
        zones.move_card(ZoneName::Deck, ZoneName::BattleSlot, "d0"),
        Err(MoveError::IllegalMove {
            from: ZoneName::Deck,
            to: ZoneName::BattleSlot
        })
    );
}

#[test]
fn discard_round_trips_through_deck_and_hand() {
    let mut zones = setup(2, 1, 0);
    zones
        .move_card(ZoneName::Hand, ZoneName::Discard, "h0")
        .expect("hand to discard");
    zones
        .move_card(ZoneName::Deck, ZoneName::Discard, "d1")
        .expect("deck to discard");
    zones
        .move_card(ZoneName::Discard, ZoneName::Hand, "d1")
        .expect("discard to hand");
    zones
        .move_card(ZoneName::Discard, ZoneName::Deck, "h0")
        .expect("discard to deck");
    assert_eq!(ids(&zones, ZoneName::Deck), vec!["d0", "h0"]);
    assert_eq!(ids(&zones, ZoneName::Hand), vec!["d1"]);
    assert!(zones.cards(ZoneName::Discard).is_empty());
}

#[test]
fn clearing_discard_moves_everything_to_collection() {
    let mut zones = setup(0, 0, 3);
    for i in 0..3 {
        zones
            .move_card(ZoneName::Collection, ZoneName::Discard, &format!("x{}", i))
            .expect("to discard");
    }
    assert_eq!(zones.clear_zone_to_collection(ZoneName::Discard), Ok(3));
    assert!(zones.cards(ZoneName::Discard).is_empty());
    assert_eq!(ids(&zones, ZoneName::Collection), vec!["x0", "x1", "x2"]);
}

#[test]
fn fold_into_collection_empties_player_zones() {
    let mut zones = setup(4, 3, 1);
    zones
        .move_card(ZoneName::Hand, ZoneName::BattleSlot, "h2")
        .expect("slot");
    zones
        .move_card(ZoneName::Hand, ZoneName::Discard, "h1")
        .expect("discard");
    assert_eq!(zones.fold_into_collection(), 7);
    assert_eq!(zones.cards(ZoneName::Collection).len(), 8);
    assert_eq!(zones.playable_count(), 0);
    assert!(zones.battle_card().is_none());
}
