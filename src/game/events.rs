//! Game Events
//!
//! Public facts in the order they were attested. Nothing in here may
//! identify the submitter of an anonymous action.

use serde::{Serialize, Deserialize};

use crate::core::hash::Digest;
use crate::game::action::ActionKind;
use crate::game::state::{Phase, PlayerIndex, Role, Winner};

/// Game event data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEventData {
    /// Game registered with the verifier and entered its first night.
    GameStarted {
        /// Identity tree root.
        tree_root: Digest,
        /// Number of players.
        player_count: usize,
    },

    /// An anonymous action was accepted, keyed by nullifier only.
    ActionAccepted {
        /// Night action or day vote.
        kind: ActionKind,
        /// Nullifier.
        nullifier: Digest,
    },

    /// Night resolved.
    NightResolved {
        /// Player killed, if any.
        victim: Option<PlayerIndex>,
    },

    /// Day resolved.
    DayResolved {
        /// Player eliminated, if any.
        eliminated: Option<PlayerIndex>,
    },

    /// A role commitment was opened.
    RoleRevealed {
        /// Player index.
        index: PlayerIndex,
        /// Revealed role.
        role: Role,
    },

    /// Game reached `Finished`.
    GameFinished {
        /// Winning side, `None` when ended by the operator.
        winner: Option<Winner>,
    },
}

/// A game event with its position in the game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Round when the event occurred.
    pub round: u32,

    /// Phase when the event occurred.
    pub phase: Phase,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(round: u32, phase: Phase, data: GameEventData) -> Self {
        Self { round, phase, data }
    }

    /// Player the event is about, if any.
    pub fn player(&self) -> Option<PlayerIndex> {
        match &self.data {
            GameEventData::NightResolved { victim } => *victim,
            GameEventData::DayResolved { eliminated } => *eliminated,
            GameEventData::RoleRevealed { index, .. } => Some(*index),
            _ => None,
        }
    }
}

/// Serialize an event log as JSON.
pub fn events_to_json(events: &[GameEvent]) -> Result<String, serde_json::Error> {
    serde_json::to_string(events)
}

/// Parse an event log from JSON.
pub fn events_from_json(s: &str) -> Result<Vec<GameEvent>, serde_json::Error> {
    serde_json::from_str(s)
}
