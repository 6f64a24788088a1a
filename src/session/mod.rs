//! The battle session: owns every zone, the opponent, the ledger and the
//! cooldown, and drives the battle lifecycle
//! `Idle -> Staging -> Resolved -> (Staging | Idle)`.
//!
//! Each successful operation appends one event to the notification log and
//! writes the whole session through to storage before returning.

use rand::{RngCore, SeedableRng};
use rand_pcg::Lcg64Xsh32;
use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

pub mod endpoints;
pub mod events;
pub mod persistence;

use crate::battle::{self, BattleError, MatchLedger, Outcome};
use crate::card::{draw_with_fallback, Card, CardSupply};
use crate::config::GameConfig;
use crate::cooldown::{format_time_left, now_ms, CooldownGate, CooldownView};
use crate::opponent::Opponent;
use crate::zones::{MoveError, ZoneName, ZoneSnapshot, ZoneStore};
use events::{EventEntry, EventLog, SessionEvent};
use persistence::{SavedBattleState, SavedSession, SessionPersistence, SAVE_VERSION};

/// Cards per booster.
pub const BOOSTER_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub enum BattlePhase {
    #[default]
    Idle,
    Staging,
    Resolved,
}

/// How leaving a battle treats the player's cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub enum ExitPolicy {
    /// Put deck, hand and discard back as they were when the battle started.
    /// The ledger keeps the battles played.
    Restore,
    /// Fold every player card into the collection and reset ledger, cooldown
    /// and opponent.
    Finish,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct BattleReport {
    pub outcome: Outcome,
    pub player_score: i64,
    pub opponent_score: i64,
    pub player_card: Card,
    pub opponent_card: Card,
    pub ledger: MatchLedger,
    pub win_rate: u32,
    /// Wins or losses reached the match point.
    pub match_over: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    Move(MoveError),
    Battle(BattleError),
    NotInBattle,
    AlreadyInBattle,
    WrongPhase {
        expected: BattlePhase,
        actual: BattlePhase,
    },
    /// The zone cannot be used in the current phase.
    ZoneLocked(ZoneName),
    CooldownActive {
        time_left_ms: u64,
    },
    /// Another card-supply request is still running.
    SupplyBusy,
    OpponentOutOfCards,
}

impl SessionError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, SessionError::Move(MoveError::CardNotFound { .. }))
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Move(e) => write!(f, "{}", e),
            SessionError::Battle(e) => write!(f, "{}", e),
            SessionError::NotInBattle => write!(f, "No battle in progress"),
            SessionError::AlreadyInBattle => write!(f, "A battle is already in progress"),
            SessionError::WrongPhase { expected, actual } => write!(
                f,
                "Battle must be {:?} for this action, but is {:?}",
                expected, actual
            ),
            SessionError::ZoneLocked(zone) => {
                write!(f, "The {} cannot be used right now", zone)
            }
            SessionError::CooldownActive { time_left_ms } => write!(
                f,
                "Next booster available in {}",
                format_time_left(*time_left_ms)
            ),
            SessionError::SupplyBusy => write!(f, "A card draw is already in progress"),
            SessionError::OpponentOutOfCards => write!(f, "The opponent has no card to play"),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<MoveError> for SessionError {
    fn from(e: MoveError) -> Self {
        SessionError::Move(e)
    }
}

impl From<BattleError> for SessionError {
    fn from(e: BattleError) -> Self {
        SessionError::Battle(e)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct GameStats {
    pub collection_size: usize,
    pub deck_size: usize,
    pub hand_size: usize,
    pub discard_size: usize,
    /// Deck + hand.
    pub total_cards: usize,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub games_played: u32,
    pub win_rate: u32,
    pub total_cards_drawn: u64,
    pub can_draw: bool,
    pub time_until_next_draw: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct SessionView {
    pub phase: BattlePhase,
    pub in_battle: bool,
    pub zones: ZoneStore,
    pub opponent: Opponent,
    pub ledger: MatchLedger,
    pub win_rate: u32,
    pub cooldown: CooldownView,
}

pub struct Session {
    zones: ZoneStore,
    opponent: Opponent,
    ledger: MatchLedger,
    cooldown: CooldownGate,
    phase: BattlePhase,
    pre_battle: Option<ZoneSnapshot>,
    events: EventLog,
    rng: Lcg64Xsh32,
    opponent_stock: usize,
    supply: Arc<dyn CardSupply>,
    persistence: SessionPersistence,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("phase", &self.phase)
            .field("zones", &self.zones)
            .field("opponent", &self.opponent)
            .field("ledger", &self.ledger)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Build a session, resuming from `persistence` when it holds a valid save.
    pub fn new(
        config: &GameConfig,
        supply: Arc<dyn CardSupply>,
        persistence: SessionPersistence,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => Lcg64Xsh32::seed_from_u64(seed),
            None => Lcg64Xsh32::from_entropy(),
        };
        let mut session = Session {
            zones: ZoneStore::new(),
            opponent: Opponent::new(),
            ledger: MatchLedger::new(),
            cooldown: CooldownGate::new(config.cooldown),
            phase: BattlePhase::Idle,
            pre_battle: None,
            events: EventLog::new(),
            rng,
            opponent_stock: config.opponent_stock,
            supply,
            persistence,
        };
        if let Some(saved) = session.persistence.load() {
            session.apply_saved(saved, config);
        }
        session
    }

    fn apply_saved(&mut self, saved: SavedSession, config: &GameConfig) {
        self.zones = saved.zones();
        self.ledger = saved.stats;
        if let Some(rng) = saved.rng {
            self.rng = rng;
        }
        self.events = EventLog::resume_after(saved.event_seq);
        self.cooldown = CooldownGate::with_last_draw(config.cooldown, saved.last_draw_time);
        match saved.battle_state {
            Some(state) => {
                self.opponent = state.opponent;
                self.phase = if state.in_battle {
                    state.phase
                } else {
                    BattlePhase::Idle
                };
                self.pre_battle = state.pre_battle;
            }
            None => {
                self.opponent = Opponent::new();
                self.phase = BattlePhase::Idle;
                self.pre_battle = None;
            }
        }
        log::info!(
            "resumed session: {} cards in collection, {} games played",
            self.zones.collection.len(),
            self.ledger.games_played
        );
    }

    pub fn zones(&self) -> &ZoneStore {
        &self.zones
    }

    pub fn opponent(&self) -> &Opponent {
        &self.opponent
    }

    pub fn ledger(&self) -> &MatchLedger {
        &self.ledger
    }

    pub fn phase(&self) -> BattlePhase {
        self.phase
    }

    pub fn in_battle(&self) -> bool {
        self.phase != BattlePhase::Idle
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn pre_battle_snapshot(&self) -> Option<&ZoneSnapshot> {
        self.pre_battle.as_ref()
    }

    pub fn cooldown(&self) -> &CooldownGate {
        &self.cooldown
    }

    pub fn cooldown_view(&self, now_ms: u64) -> CooldownView {
        CooldownView::at(&self.cooldown, now_ms)
    }

    pub fn stats(&self, now_ms: u64) -> GameStats {
        let left = self.cooldown.time_left_ms(now_ms);
        GameStats {
            collection_size: self.zones.collection.len(),
            deck_size: self.zones.deck.len(),
            hand_size: self.zones.hand.len(),
            discard_size: self.zones.discard.len(),
            total_cards: self.zones.playable_count(),
            wins: self.ledger.wins,
            losses: self.ledger.losses,
            draws: self.ledger.draws,
            games_played: self.ledger.games_played,
            win_rate: self.ledger.win_rate(),
            total_cards_drawn: self.ledger.total_cards_drawn,
            can_draw: left == 0,
            time_until_next_draw: format_time_left(left),
        }
    }

    pub fn view(&self, now_ms: u64) -> SessionView {
        SessionView {
            phase: self.phase,
            in_battle: self.in_battle(),
            zones: self.zones.clone(),
            opponent: self.opponent.clone(),
            ledger: self.ledger.clone(),
            win_rate: self.ledger.win_rate(),
            cooldown: self.cooldown_view(now_ms),
        }
    }

    /// Zone rules for both sides.
    pub fn check_invariants(&self) -> Result<(), String> {
        self.zones.check_invariants()?;
        self.opponent.check_invariants()
    }

    /// Move a player card. During a battle the collection is off limits;
    /// outside one the battle slot is. Cards enter the battle slot only
    /// while staging.
    pub fn move_card(
        &mut self,
        from: ZoneName,
        to: ZoneName,
        card_id: &str,
    ) -> Result<EventEntry, SessionError> {
        let touches = |zone: ZoneName| from == zone || to == zone;
        if self.in_battle() && touches(ZoneName::Collection) {
            return Err(SessionError::ZoneLocked(ZoneName::Collection));
        }
        if !self.in_battle() && touches(ZoneName::BattleSlot) {
            return Err(SessionError::ZoneLocked(ZoneName::BattleSlot));
        }
        if to == ZoneName::BattleSlot && self.phase != BattlePhase::Staging {
            return Err(SessionError::WrongPhase {
                expected: BattlePhase::Staging,
                actual: self.phase,
            });
        }

        let report = self.zones.move_card(from, to, card_id)?;
        if to == ZoneName::BattleSlot && self.opponent.battle_card().is_none() {
            self.opponent.pick_from_hand(&mut self.rng);
        }
        let event = SessionEvent::CardMoved {
            from,
            to,
            card_id: report.card.id,
            displaced: report.displaced.map(|c| c.id),
        };
        Ok(self.commit(event))
    }

    pub fn move_opponent_card(
        &mut self,
        from: ZoneName,
        to: ZoneName,
        card_id: &str,
    ) -> Result<EventEntry, SessionError> {
        if !self.in_battle() {
            return Err(SessionError::NotInBattle);
        }
        let card = self.opponent.move_card(from, to, card_id)?;
        Ok(self.commit(SessionEvent::OpponentCardMoved {
            from,
            to,
            card_id: card.id,
        }))
    }

    pub fn shuffle_deck(&mut self) -> EventEntry {
        self.zones.shuffle(ZoneName::Deck, &mut self.rng);
        self.commit(SessionEvent::DeckShuffled)
    }

    /// Empty `zone` into the collection. Not available during a battle.
    pub fn clear_zone(&mut self, zone: ZoneName) -> Result<EventEntry, SessionError> {
        if self.in_battle() {
            return Err(SessionError::ZoneLocked(ZoneName::Collection));
        }
        let count = self.zones.clear_zone_to_collection(zone)?;
        Ok(self.commit(SessionEvent::ZoneCleared { zone, count }))
    }

    /// Draw a booster into the collection and restock the opponent deck.
    pub async fn draw_booster(&mut self, now_ms: u64) -> Result<EventEntry, SessionError> {
        let time_left_ms = self.cooldown.time_left_ms(now_ms);
        if time_left_ms > 0 {
            return Err(SessionError::CooldownActive { time_left_ms });
        }
        let mut cards = draw_with_fallback(&*self.supply, BOOSTER_SIZE, &mut self.rng).await;
        self.make_ids_unique(&mut cards);
        let card_ids: Vec<String> = cards.iter().map(|c| c.id.clone()).collect();
        self.ledger.record_cards_drawn(cards.len());
        self.zones.add_to_collection(cards);
        self.cooldown.record_draw(now_ms);

        let opponent_stocked = self
            .opponent
            .stock_deck(self.opponent_stock, &*self.supply, &mut self.rng)
            .await;
        log::info!(
            "booster drawn: {} cards, opponent deck +{}",
            card_ids.len(),
            opponent_stocked
        );
        Ok(self.commit(SessionEvent::BoosterDrawn {
            card_ids,
            opponent_stocked,
        }))
    }

    /// Give a fresh id to every card whose id is already held by the player
    /// or repeated within `cards`.
    fn make_ids_unique(&mut self, cards: &mut [Card]) {
        let mut taken: HashSet<String> = HashSet::new();
        for card in cards.iter_mut() {
            if self.zones.locate(&card.id).is_some() || taken.contains(&card.id) {
                let original = card.id.clone();
                while self.zones.locate(&card.id).is_some() || taken.contains(&card.id) {
                    card.id = format!("{}-{:08x}", original, self.rng.next_u32());
                }
                log::warn!("card id {} already in use, issued as {}", original, card.id);
            }
            taken.insert(card.id.clone());
        }
    }

    /// `Idle -> Staging`: remember the player's zones, make sure the
    /// opponent holds a hand, and let it pick a card.
    pub async fn enter_battle(&mut self) -> Result<EventEntry, SessionError> {
        if self.in_battle() {
            return Err(SessionError::AlreadyInBattle);
        }
        self.pre_battle = Some(self.zones.snapshot_battle_zones());
        self.opponent.refill_hand_from_deck();
        if self.opponent.hand().is_empty() {
            self.opponent.init_hand(&*self.supply, &mut self.rng).await;
        }
        let chosen = self
            .opponent
            .choose_battle_card(&*self.supply, &mut self.rng)
            .await;
        self.phase = BattlePhase::Staging;
        log::info!("battle started");
        Ok(self.commit(SessionEvent::BattleEntered {
            opponent_card_id: chosen.map(|c| c.id),
        }))
    }

    /// `Staging -> Resolved`. With an empty slot on either side nothing
    /// changes and the ledger is left alone.
    pub fn resolve_battle(&mut self) -> Result<EventEntry, SessionError> {
        self.expect_phase(BattlePhase::Staging)?;
        let result = battle::resolve(self.zones.battle_card(), self.opponent.battle_card())?;

        let slot_id = self.player_slot_id();
        let player_card = self
            .zones
            .move_card(ZoneName::BattleSlot, ZoneName::Discard, &slot_id)?
            .card;
        let opponent_card = self
            .opponent
            .discard_battle_card()
            .ok_or(SessionError::OpponentOutOfCards)?;
        self.ledger.record(result.outcome);
        self.phase = BattlePhase::Resolved;

        let report = BattleReport {
            outcome: result.outcome,
            player_score: result.player_score,
            opponent_score: result.opponent_score,
            player_card,
            opponent_card,
            ledger: self.ledger.clone(),
            win_rate: self.ledger.win_rate(),
            match_over: self.ledger.match_over(),
        };
        log::info!(
            "battle resolved: {:?} ({} vs {})",
            report.outcome,
            report.player_score,
            report.opponent_score
        );
        Ok(self.commit(SessionEvent::BattleResolved(report)))
    }

    fn player_slot_id(&self) -> String {
        self.zones
            .battle_card()
            .map(|c| c.id.clone())
            .unwrap_or_default()
    }

    /// `Resolved -> Staging`: empty both slots and let the opponent pick again.
    pub async fn replay(&mut self) -> Result<EventEntry, SessionError> {
        self.expect_phase(BattlePhase::Resolved)?;
        if self.zones.battle_card().is_some() {
            let id = self.player_slot_id();
            self.zones
                .move_card(ZoneName::BattleSlot, ZoneName::Hand, &id)?;
        }
        self.opponent.clear_battle_slot();
        let chosen = self
            .opponent
            .choose_battle_card(&*self.supply, &mut self.rng)
            .await;
        self.phase = BattlePhase::Staging;
        Ok(self.commit(SessionEvent::BattleReplayed {
            opponent_card_id: chosen.map(|c| c.id),
        }))
    }

    /// Leave the battle, from `Staging` or `Resolved`.
    pub fn exit_battle(&mut self, policy: ExitPolicy) -> Result<EventEntry, SessionError> {
        if !self.in_battle() {
            return Err(SessionError::NotInBattle);
        }
        match policy {
            ExitPolicy::Restore => {
                match self.pre_battle.take() {
                    Some(snapshot) => self.zones.restore_battle_zones(snapshot),
                    None => {
                        let id = self.player_slot_id();
                        if !id.is_empty() {
                            self.zones
                                .move_card(ZoneName::BattleSlot, ZoneName::Hand, &id)?;
                        }
                    }
                }
                self.opponent.clear_battle_slot();
            }
            ExitPolicy::Finish => self.reset_game(),
        }
        self.phase = BattlePhase::Idle;
        self.pre_battle = None;
        log::info!("battle exited ({:?})", policy);
        Ok(self.commit(SessionEvent::BattleExited { policy }))
    }

    /// Start over: every player card back in the collection, ledger,
    /// cooldown and opponent reset.
    pub fn new_game(&mut self) -> EventEntry {
        self.reset_game();
        self.phase = BattlePhase::Idle;
        self.pre_battle = None;
        self.commit(SessionEvent::NewGame)
    }

    fn reset_game(&mut self) {
        let folded = self.zones.fold_into_collection();
        self.ledger.reset();
        self.cooldown.reset();
        self.opponent.reset();
        log::debug!("{} cards folded back into the collection", folded);
    }

    pub fn set_seed(&mut self, seed: u64) -> EventEntry {
        self.rng = Lcg64Xsh32::seed_from_u64(seed);
        self.commit(SessionEvent::SeedSet { seed })
    }

    fn expect_phase(&self, expected: BattlePhase) -> Result<(), SessionError> {
        match self.phase {
            BattlePhase::Idle => Err(SessionError::NotInBattle),
            actual if actual != expected => Err(SessionError::WrongPhase { expected, actual }),
            _ => Ok(()),
        }
    }

    fn commit(&mut self, event: SessionEvent) -> EventEntry {
        let entry = self.events.append(event);
        self.persist();
        entry
    }

    fn saved(&self) -> SavedSession {
        SavedSession {
            version: SAVE_VERSION,
            collection: self.zones.collection.clone(),
            deck: self.zones.deck.clone(),
            hand: self.zones.hand.clone(),
            discard: self.zones.discard.clone(),
            battle_slot: self.zones.battle_slot.clone(),
            stats: self.ledger.clone(),
            last_draw_time: self.cooldown.last_draw_ms(),
            last_save_time: now_ms(),
            battle_state: Some(SavedBattleState {
                opponent: self.opponent.clone(),
                in_battle: self.in_battle(),
                phase: self.phase,
                pre_battle: self.pre_battle.clone(),
            }),
            rng: Some(self.rng.clone()),
            event_seq: self.events.last_seq(),
        }
    }

    /// Write-through of the full session. Failures leave the session running
    /// in memory.
    fn persist(&mut self) {
        let doc = self.saved();
        if let Err(e) = self.persistence.save(&doc) {
            log::warn!("could not save session: {}", e);
        }
    }
}
