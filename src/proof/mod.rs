//! Proof Material
//!
//! Commitments, the identity tree and the verifier boundary.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PROOF LAYER                              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  commitment.rs  - Salts, role commitments, nullifiers       │
//! │  merkle.rs      - Fixed-depth identity tree                 │
//! │  verify.rs      - Verifier trait and attestations           │
//! │  ledger.rs      - In-memory reference verifier              │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod commitment;
pub mod merkle;
pub mod verify;
pub mod ledger;

// Re-export key types
pub use commitment::{MasterSecret, IdentitySecret, Salt, commit_role, opens_to, check_fairness};
pub use merkle::{IdentityTree, AuthPath, TREE_DEPTH, MAX_LEAVES};
pub use verify::{
    Verifier, VerifierError, GameRegistration, PlayerConfig,
    NightAttestation, DayAttestation, RoleOpening,
};
pub use ledger::InMemoryLedger;
