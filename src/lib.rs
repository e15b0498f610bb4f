//! # Werewolf Trusted Node
//!
//! Engine for a social deduction game where roles stay secret behind
//! commitments and player actions reach the verifier under a membership
//! proof and nullifier instead of a player index.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    WEREWOLF NODE                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                 │
//! │  ├── hash.rs     - Domain-separated SHA-256                 │
//! │  └── rng.rs      - Xorshift128+ PRNG for the role shuffle   │
//! │                                                             │
//! │  proof/          - Commitments and authentication           │
//! │  ├── commitment.rs - Salts, role commitments, nullifiers    │
//! │  ├── merkle.rs   - Depth-10 identity tree                   │
//! │  ├── verify.rs   - Verifier trait                           │
//! │  └── ledger.rs   - In-memory reference verifier             │
//! │                                                             │
//! │  game/           - One game                                 │
//! │  ├── state.rs    - Roles, phases, player store              │
//! │  ├── action.rs   - Anonymous actions                        │
//! │  ├── resolve.rs  - Night/day resolution, win conditions     │
//! │  ├── events.rs   - Public event log                         │
//! │  └── engine.rs   - Game state machine                       │
//! │                                                             │
//! │  node/           - Many games                               │
//! │  ├── config.rs   - Node configuration                       │
//! │  └── registry.rs - Games keyed by id                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Privacy Model
//!
//! The node is trusted with every role, salt and identity secret. What
//! leaves it is public by construction:
//! - Role commitments `H(role || salt)`, opened only on elimination
//! - One identity tree root, fixed at creation
//! - Actions: sealed payload, membership proof, nullifier
//! - Night and day outcomes
//!
//! Actions are anonymous only when the verifier never sees their witness.
//! The authentication path encodes the player's index and the identity
//! secret maps to a registered public key. [`proof::InMemoryLedger`] reads
//! both in the clear, so against it every action is attributable; a real
//! proof backend has to keep the witness private.
//!
//! Salts are derived from a master secret, so publishing the master secret
//! after the game lets anyone audit every role assignment.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod game;
pub mod node;
pub mod proof;

// Re-export commonly used types
pub use error::{GameError, GameResult, ErrorClass};
pub use game::{Game, GameConfig, GameId, PlayerIndex, Phase, Role, Winner, ActionReceipt};
pub use node::{GameRegistry, NodeConfig};
pub use proof::{InMemoryLedger, MasterSecret, Verifier, VerifierError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
