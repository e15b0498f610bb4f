//! Commitment Primitives
//!
//! Binding values published at game creation and opened later:
//! - Role commitments `H(role || salt)`, opened on elimination
//! - Per-player salts derived from the master secret (fairness audits)
//! - The master secret commitment, which authorizes a forced end
//! - Action nullifiers, which let the verifier deduplicate anonymous
//!   submissions without learning who made them

use std::fmt;

use rand::RngCore;
use serde::{Serialize, Deserialize};

use crate::core::hash::{Digest, DigestWriter, hash_with_domain};
use crate::game::state::{GameId, Phase, PlayerIndex, Role};

/// Domain separator for identity tree leaves.
const LEAF_DOMAIN: &[u8] = b"WEREWOLF_IDENTITY_LEAF_V1";

/// Domain separator for placeholder public keys.
const PUBLIC_KEY_DOMAIN: &[u8] = b"WEREWOLF_PUBLIC_KEY_V1";

/// Domain separator for salt derivation.
const SALT_DOMAIN: &[u8] = b"WEREWOLF_ROLE_SALT_V1";

/// Domain separator for role commitments.
const ROLE_COMMIT_DOMAIN: &[u8] = b"WEREWOLF_ROLE_COMMIT_V1";

/// Domain separator for the master secret commitment.
const MASTER_COMMIT_DOMAIN: &[u8] = b"WEREWOLF_MASTER_COMMIT_V1";

/// Domain separator for action nullifiers.
const NULLIFIER_DOMAIN: &[u8] = b"WEREWOLF_NULLIFIER_V1";

/// Per-player role commitment salt.
pub type Salt = [u8; 32];

/// Master secret the whole role assignment is derived from.
///
/// Held by the game operator, never stored by the engine after creation.
#[derive(Clone, PartialEq, Eq)]
pub struct MasterSecret([u8; 32]);

impl MasterSecret {
    /// Wrap raw secret bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Generate a fresh secret from the OS-seeded thread RNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Raw secret bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Commitment published at game creation.
    pub fn commitment(&self) -> Digest {
        hash_with_domain(MASTER_COMMIT_DOMAIN, &self.0)
    }
}

impl fmt::Debug for MasterSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterSecret(<redacted>)")
    }
}

/// A player's identity secret. Its hash is the player's identity tree leaf.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentitySecret([u8; 32]);

impl IdentitySecret {
    /// Wrap raw secret bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Generate a fresh secret from the OS-seeded thread RNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Identity tree leaf for this secret.
    pub fn leaf(&self) -> Digest {
        hash_with_domain(LEAF_DOMAIN, &self.0)
    }

    /// Placeholder public key. Stands in for a real signing key.
    pub fn public_key(&self) -> Digest {
        hash_with_domain(PUBLIC_KEY_DOMAIN, &self.0)
    }

    /// Nullifier for one action slot (game, round, phase).
    ///
    /// Identical for every submission the same player makes in the same
    /// slot, and unlinkable across slots without the secret.
    pub fn nullifier(&self, game_id: &GameId, round: u32, phase: Phase) -> Digest {
        let mut writer = DigestWriter::new(NULLIFIER_DOMAIN);
        writer.update_bytes(&self.0);
        writer.update_bytes(game_id);
        writer.update_u32(round);
        writer.update_u8(phase.code());
        writer.finalize()
    }
}

impl fmt::Debug for IdentitySecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("IdentitySecret(<redacted>)")
    }
}

/// Derive the role salt for a player from the master secret.
pub fn derive_salt(master: &MasterSecret, index: PlayerIndex) -> Salt {
    let mut writer = DigestWriter::new(SALT_DOMAIN);
    writer.update_bytes(master.as_bytes());
    writer.update_index(index);
    writer.finalize()
}

/// Bind a role to a salt.
pub fn commit_role(role: Role, salt: &Salt) -> Digest {
    let mut writer = DigestWriter::new(ROLE_COMMIT_DOMAIN);
    writer.update_u8(role.code());
    writer.update_bytes(salt);
    writer.finalize()
}

/// Check a role opening against a published commitment.
pub fn opens_to(commitment: &Digest, role: Role, salt: &Salt) -> bool {
    commit_role(role, salt) == *commitment
}

/// Fairness check: was `claimed` derived from `master` for player `index`?
pub fn check_fairness(
    commitment: &Digest,
    master: &MasterSecret,
    index: PlayerIndex,
    claimed: Role,
) -> bool {
    opens_to(commitment, claimed, &derive_salt(master, index))
}
