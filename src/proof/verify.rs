//! Verifier Interface
//!
//! The on-chain / circuit side of the game, reached through one narrow
//! trait. The verifier is the source of truth for what is publicly
//! attested: the engine calls it before committing any local change.

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::hash::Digest;
use crate::game::action::AnonymousAction;
use crate::game::state::{GameId, Phase, PlayerIndex, Role, Winner};
use crate::proof::commitment::{MasterSecret, Salt};

/// Public per-player data registered at game creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Player index.
    pub index: PlayerIndex,
    /// Role commitment `H(role || salt)`.
    pub role_commitment: Digest,
    /// Placeholder public key.
    pub public_key: Digest,
}

/// Everything published when a game is created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRegistration {
    /// Game identifier.
    pub game_id: GameId,
    /// Admin authorization key.
    pub admin_key: Digest,
    /// Identity tree root. Fixed for the life of the game.
    pub tree_root: Digest,
    /// Commitment to the master secret.
    pub master_commitment: Digest,
    /// Per-player public data, in index order.
    pub players: Vec<PlayerConfig>,
    /// Number of players.
    pub player_count: usize,
    /// Number of werewolves.
    pub werewolf_count: usize,
}

/// Opening of a role commitment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleOpening {
    /// Committed role.
    pub role: Role,
    /// Salt the commitment was made with.
    pub salt: Salt,
}

/// Public facts of a night resolution, attested in one call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NightAttestation {
    /// Round number after the night.
    pub new_round: u32,
    /// Player killed, if any.
    pub victim: Option<PlayerIndex>,
    /// Identity tree root (unchanged: membership is fixed at creation).
    pub tree_root: Digest,
    /// Set when the night's death ends the game.
    pub winner: Option<Winner>,
}

impl NightAttestation {
    /// Did someone die?
    pub fn has_death(&self) -> bool {
        self.victim.is_some()
    }
}

/// Public facts of a day resolution, attested in one call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayAttestation {
    /// Player eliminated by vote, if any.
    pub eliminated: Option<PlayerIndex>,
    /// Opening of the eliminated player's commitment. `None` when there
    /// is no elimination or the role was already revealed.
    pub opening: Option<RoleOpening>,
    /// Set when the elimination ends the game.
    pub winner: Option<Winner>,
}

impl DayAttestation {
    /// Was someone eliminated?
    pub fn has_elimination(&self) -> bool {
        self.eliminated.is_some()
    }
}

/// Errors reported by the verifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifierError {
    /// No game registered under this id.
    #[error("unknown game {0}")]
    UnknownGame(String),

    /// Registration rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Membership proof or nullifier rejected.
    #[error("membership proof rejected")]
    InvalidMembershipProof,

    /// Role opening rejected.
    #[error("commitment mismatch for player {index}")]
    CommitmentMismatch {
        /// Player whose opening failed.
        index: PlayerIndex,
    },

    /// Master secret rejected.
    #[error("unauthorized")]
    Unauthorized,

    /// Public state disagrees with the request (phase, round or root).
    #[error("state mismatch: {0}")]
    StateMismatch(String),

    /// Verifier could not be reached.
    #[error("verifier unavailable: {0}")]
    Unavailable(String),
}

/// The verifier collaborator.
///
/// Every call may fail independently of local state. Implementations must
/// be safe to share between games.
pub trait Verifier: Send + Sync {
    /// Register a new game.
    fn create_game(&self, registration: &GameRegistration) -> Result<(), VerifierError>;

    /// Accept an anonymous night action.
    fn night_action(&self, game_id: &GameId, action: &AnonymousAction) -> Result<(), VerifierError>;

    /// Accept an anonymous day vote.
    fn vote_day(&self, game_id: &GameId, action: &AnonymousAction) -> Result<(), VerifierError>;

    /// Attest a night resolution. A winner moves the game to `Finished`.
    fn resolve_night_phase(
        &self,
        game_id: &GameId,
        attestation: &NightAttestation,
    ) -> Result<(), VerifierError>;

    /// Attest a day resolution, opening the eliminated player's role. A
    /// winner moves the game to `Finished`.
    fn resolve_day_phase(
        &self,
        game_id: &GameId,
        attestation: &DayAttestation,
    ) -> Result<(), VerifierError>;

    /// Publicly open a player's role commitment.
    fn reveal_player_role(
        &self,
        game_id: &GameId,
        index: PlayerIndex,
        role: Role,
        salt: &Salt,
    ) -> Result<(), VerifierError>;

    /// Audit query: was `role` derived from `master` for player `index`?
    fn verify_fairness(
        &self,
        game_id: &GameId,
        master: &MasterSecret,
        index: PlayerIndex,
        role: Role,
    ) -> bool;

    /// End the game with the master secret as authorization.
    fn force_end_game(&self, game_id: &GameId, master: &MasterSecret) -> Result<(), VerifierError>;

    /// Public (phase, round).
    fn get_game_state(&self, game_id: &GameId) -> Result<(Phase, u32), VerifierError>;
}
