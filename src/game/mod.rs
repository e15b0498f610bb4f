//! Game Logic Module
//!
//! The trusted node's side of one game.
//!
//! ## Module Structure
//!
//! - `state`: Roles, phases, player records and the player store
//! - `action`: Anonymous action construction
//! - `resolve`: Night/day resolution and win conditions
//! - `events`: Public event log
//! - `engine`: The `Game` state machine

pub mod state;
pub mod action;
pub mod resolve;
pub mod events;
pub mod engine;

// Re-export key types
pub use state::{GameId, PlayerIndex, Role, Phase, Winner, RoleOrder, PlayerStore, expected_roles};
pub use action::{ActionKind, ActionReceipt, AnonymousAction};
pub use resolve::{NightOutcome, DayOutcome};
pub use events::{GameEvent, GameEventData};
pub use engine::{Game, GameConfig};
