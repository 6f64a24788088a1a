use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;
use std::collections::VecDeque;

use super::{BattleReport, ExitPolicy};
use crate::zones::ZoneName;

/// Oldest entries are dropped past this many.
pub const MAX_EVENTS: usize = 1000;

/// State-changed notifications, one per successful mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", tag = "type")]
pub enum SessionEvent {
    CardMoved {
        from: ZoneName,
        to: ZoneName,
        card_id: String,
        displaced: Option<String>,
    },
    OpponentCardMoved {
        from: ZoneName,
        to: ZoneName,
        card_id: String,
    },
    DeckShuffled,
    ZoneCleared {
        zone: ZoneName,
        count: usize,
    },
    BoosterDrawn {
        card_ids: Vec<String>,
        opponent_stocked: usize,
    },
    BattleEntered {
        opponent_card_id: Option<String>,
    },
    BattleResolved(BattleReport),
    BattleReplayed {
        opponent_card_id: Option<String>,
    },
    BattleExited {
        policy: ExitPolicy,
    },
    NewGame,
    SeedSet {
        seed: u64,
    },
}

impl SessionEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            SessionEvent::CardMoved { .. } => "CardMoved",
            SessionEvent::OpponentCardMoved { .. } => "OpponentCardMoved",
            SessionEvent::DeckShuffled => "DeckShuffled",
            SessionEvent::ZoneCleared { .. } => "ZoneCleared",
            SessionEvent::BoosterDrawn { .. } => "BoosterDrawn",
            SessionEvent::BattleEntered { .. } => "BattleEntered",
            SessionEvent::BattleResolved(_) => "BattleResolved",
            SessionEvent::BattleReplayed { .. } => "BattleReplayed",
            SessionEvent::BattleExited { .. } => "BattleExited",
            SessionEvent::NewGame => "NewGame",
            SessionEvent::SeedSet { .. } => "SeedSet",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct EventEntry {
    pub seq: u64,
    pub event_type: String,
    pub payload: SessionEvent,
    /// Milliseconds since the Unix epoch, as a string.
    pub timestamp: String,
}

#[derive(Debug, Clone, Default)]
pub struct EventLog {
    entries: VecDeque<EventEntry>,
    seq: u64,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty log whose next entry is `seq + 1`. Entries are not kept across
    /// restarts, only the numbering is.
    pub fn resume_after(seq: u64) -> Self {
        EventLog {
            entries: VecDeque::new(),
            seq,
        }
    }

    /// Append an event, assigning the next sequence number.
    pub fn append(&mut self, event: SessionEvent) -> EventEntry {
        self.seq += 1;
        let entry = EventEntry {
            seq: self.seq,
            event_type: event.kind().to_string(),
            payload: event,
            timestamp: crate::cooldown::now_ms().to_string(),
        };
        self.entries.push_back(entry.clone());
        while self.entries.len() > MAX_EVENTS {
            self.entries.pop_front();
        }
        entry
    }

    pub fn last_seq(&self) -> u64 {
        self.seq
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries with `seq >= from_seq`, at most `limit` of them.
    pub fn since(&self, from_seq: u64, limit: usize) -> Vec<EventEntry> {
        self.entries
            .iter()
            .filter(|e| e.seq >= from_seq)
            .take(limit)
            .cloned()
            .collect()
    }
}
