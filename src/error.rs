//! Engine Errors
//!
//! Structural errors (bad index, wrong phase, bad config) are caller bugs.
//! Proof and commitment failures are expected adversarial or stale-state
//! outcomes. `GameError::class` tells the two apart so a driver can decide
//! between retrying with fresh proofs and aborting.

use thiserror::Error;

use crate::game::state::{Phase, PlayerIndex};
use crate::proof::verify::VerifierError;

/// Engine result type.
pub type GameResult<T> = Result<T, GameError>;

/// Broad category of a [`GameError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Programmer error: surface immediately, do not retry.
    Structural,
    /// Proof or commitment rejected: retry with fresh material or flag fraud.
    Adversarial,
    /// The verifier could not be reached or disagrees about public state.
    Collaborator,
}

/// Errors produced by the trusted node engine.
///
/// Every failure is scoped to the operation that produced it; the game
/// state is left exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Index outside the identity tree or player table.
    #[error("index {index} out of range (limit {limit})")]
    InvalidIndex {
        /// Offending index.
        index: usize,
        /// Exclusive upper bound.
        limit: usize,
    },

    /// Player is not alive. Never returned by `submit_action`.
    #[error("player {0} is not alive")]
    DeadPlayer(PlayerIndex),

    /// No player with this index exists in the game.
    #[error("unknown player {0}")]
    UnknownPlayer(PlayerIndex),

    /// Operation is not legal in the current phase.
    #[error("operation requires {expected}, game is in {actual}")]
    InvalidPhase {
        /// Phase(s) the operation accepts.
        expected: &'static str,
        /// Phase the game was in.
        actual: Phase,
    },

    /// Membership proof does not reconstruct the committed root.
    #[error("membership proof rejected")]
    InvalidMembershipProof,

    /// Role opening does not match the published commitment.
    #[error("role opening for player {index} does not match its commitment")]
    CommitmentMismatch {
        /// Player whose commitment failed to open.
        index: PlayerIndex,
    },

    /// Master secret does not match the game's master commitment.
    #[error("master secret does not match commitment")]
    Unauthorized,

    /// Game configuration rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// No game registered under this identifier.
    #[error("unknown game {0}")]
    UnknownGame(String),

    /// Payload could not be encoded for sealing.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Verifier unavailable or out of sync with local state.
    #[error("verifier error: {0}")]
    Verifier(String),
}

impl GameError {
    /// Classify this error for retry/abort decisions.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidMembershipProof
            | Self::CommitmentMismatch { .. }
            | Self::Unauthorized => ErrorClass::Adversarial,
            Self::Verifier(_) => ErrorClass::Collaborator,
            _ => ErrorClass::Structural,
        }
    }

    /// Whether a driver may retry the operation with fresh proofs.
    pub fn is_retryable(&self) -> bool {
        matches!(self.class(), ErrorClass::Adversarial | ErrorClass::Collaborator)
    }
}

impl From<VerifierError> for GameError {
    fn from(err: VerifierError) -> Self {
        match err {
            VerifierError::UnknownGame(id) => Self::UnknownGame(id),
            VerifierError::InvalidConfig(msg) => Self::InvalidConfig(msg),
            VerifierError::InvalidMembershipProof => Self::InvalidMembershipProof,
            VerifierError::CommitmentMismatch { index } => Self::CommitmentMismatch { index },
            VerifierError::Unauthorized => Self::Unauthorized,
            VerifierError::StateMismatch(msg) => Self::Verifier(msg),
            VerifierError::Unavailable(msg) => Self::Verifier(msg),
        }
    }
}

impl From<bincode::Error> for GameError {
    fn from(err: bincode::Error) -> Self {
        Self::Encoding(err.to_string())
    }
}
