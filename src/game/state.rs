//! Game State Definitions
//!
//! Roles, phases and the player record store. The store owns every
//! player's secret material; roles, salts and identity secrets are only
//! reachable inside the crate.

use std::fmt;

use serde::{Serialize, Deserialize};

use crate::core::hash::Digest;
use crate::core::rng::DeterministicRng;
use crate::error::{GameError, GameResult};
use crate::proof::commitment::{
    commit_role, derive_salt, IdentitySecret, MasterSecret, Salt,
};
use crate::proof::merkle::MAX_LEAVES;

/// 32-byte game identifier.
pub type GameId = [u8; 32];

/// Player index, assigned at creation and never reused.
pub type PlayerIndex = usize;

// =============================================================================
// ROLE
// =============================================================================

/// Secret role of a player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Role {
    /// Plain villager.
    Villager = 0,
    /// Kills at night.
    Werewolf = 1,
    /// Villager-aligned seer.
    Seer = 2,
    /// Villager-aligned doctor.
    Doctor = 3,
}

impl Role {
    /// Stable one-byte encoding used inside commitments.
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Decode a role from its commitment encoding.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Role::Villager),
            1 => Some(Role::Werewolf),
            2 => Some(Role::Seer),
            3 => Some(Role::Doctor),
            _ => None,
        }
    }

    /// Is this role on the werewolf team?
    #[inline]
    pub fn is_werewolf(self) -> bool {
        self == Role::Werewolf
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Villager => "Villager",
            Role::Werewolf => "Werewolf",
            Role::Seer => "Seer",
            Role::Doctor => "Doctor",
        };
        f.write_str(name)
    }
}

// =============================================================================
// PHASE
// =============================================================================

/// Phase of the game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Default)]
pub enum Phase {
    /// Created, not yet registered with the verifier.
    #[default]
    Lobby,
    /// Werewolves choose a victim.
    Night,
    /// Everyone votes on an elimination.
    Day,
    /// Terminal.
    Finished,
}

impl Phase {
    /// Stable one-byte encoding used inside nullifiers.
    pub fn code(self) -> u8 {
        match self {
            Phase::Lobby => 0,
            Phase::Night => 1,
            Phase::Day => 2,
            Phase::Finished => 3,
        }
    }

    /// Night or Day.
    pub fn is_active(self) -> bool {
        matches!(self, Phase::Night | Phase::Day)
    }

    /// A new game may replace one in this phase.
    pub fn allows_new_game(self) -> bool {
        matches!(self, Phase::Lobby | Phase::Finished)
    }

    /// Static name, as used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            Phase::Lobby => "Lobby",
            Phase::Night => "Night",
            Phase::Day => "Day",
            Phase::Finished => "Finished",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Winning side once a win condition is met.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Winner {
    /// Every werewolf is dead.
    Villagers,
    /// Werewolves are at least as many as everyone else.
    Werewolves,
}

// =============================================================================
// ROLE ASSIGNMENT
// =============================================================================

/// How roles are laid out over player indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Default)]
pub enum RoleOrder {
    /// Werewolves first, then shuffled with a master-secret seeded RNG.
    #[default]
    Shuffled,
    /// The first `werewolf_count` indices are werewolves.
    Sequential,
}

/// Compute the role assignment a master secret produces.
///
/// The engine uses this at creation; auditors call it after the master
/// secret is published to recompute what every player must have been.
pub fn expected_roles(
    player_count: usize,
    werewolf_count: usize,
    order: RoleOrder,
    master: &MasterSecret,
    game_id: &GameId,
) -> Vec<Role> {
    let mut roles: Vec<Role> = (0..player_count)
        .map(|i| if i < werewolf_count { Role::Werewolf } else { Role::Villager })
        .collect();

    if order == RoleOrder::Shuffled {
        let mut rng = DeterministicRng::for_role_shuffle(master.as_bytes(), game_id);
        rng.shuffle(&mut roles);
    }

    roles
}

// =============================================================================
// PLAYER RECORD
// =============================================================================

/// Everything the trusted node knows about one player.
#[derive(Clone)]
pub struct PlayerRecord {
    index: PlayerIndex,
    identity_secret: IdentitySecret,
    salt: Salt,
    role: Role,
    public_key: Digest,
    alive: bool,
    has_acted: bool,
    pending_target: Option<PlayerIndex>,
}

impl PlayerRecord {
    fn new(index: PlayerIndex, role: Role, salt: Salt, identity_secret: IdentitySecret) -> Self {
        let public_key = identity_secret.public_key();
        Self {
            index,
            identity_secret,
            salt,
            role,
            public_key,
            alive: true,
            has_acted: false,
            pending_target: None,
        }
    }

    /// Player index.
    pub fn index(&self) -> PlayerIndex {
        self.index
    }

    /// Is the player alive?
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Has the player acted this phase? Always false for dead players.
    pub fn has_acted(&self) -> bool {
        self.alive && self.has_acted
    }

    /// Target submitted this phase. Dead players never have one.
    pub fn pending_target(&self) -> Option<PlayerIndex> {
        if self.alive {
            self.pending_target
        } else {
            None
        }
    }

    /// Placeholder public key.
    pub fn public_key(&self) -> Digest {
        self.public_key
    }

    /// Identity tree leaf.
    pub fn leaf(&self) -> Digest {
        self.identity_secret.leaf()
    }

    /// Role commitment published at creation.
    pub fn commitment(&self) -> Digest {
        commit_role(self.role, &self.salt)
    }

    pub(crate) fn role(&self) -> Role {
        self.role
    }

    pub(crate) fn salt(&self) -> &Salt {
        &self.salt
    }

    pub(crate) fn identity_secret(&self) -> &IdentitySecret {
        &self.identity_secret
    }
}

impl fmt::Debug for PlayerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Role and salt stay out of logs.
        f.debug_struct("PlayerRecord")
            .field("index", &self.index)
            .field("alive", &self.alive)
            .field("has_acted", &self.has_acted)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// PLAYER STORE
// =============================================================================

/// Owns all player records for the lifetime of one game.
#[derive(Clone, Debug)]
pub struct PlayerStore {
    players: Vec<PlayerRecord>,
}

impl PlayerStore {
    /// Create `count` players, `werewolf_count` of them werewolves.
    ///
    /// Salts are derived from the master secret so the assignment can be
    /// audited later; identity secrets are fresh random values.
    pub fn create_players(
        count: usize,
        werewolf_count: usize,
        order: RoleOrder,
        master: &MasterSecret,
        game_id: &GameId,
    ) -> GameResult<Self> {
        if count == 0 || count > MAX_LEAVES {
            return Err(GameError::InvalidConfig(format!(
                "player count {} outside 1..={}",
                count, MAX_LEAVES
            )));
        }
        if werewolf_count >= count {
            return Err(GameError::InvalidConfig(format!(
                "werewolf count {} must be below player count {}",
                werewolf_count, count
            )));
        }

        let roles = expected_roles(count, werewolf_count, order, master, game_id);
        let players = roles
            .into_iter()
            .enumerate()
            .map(|(index, role)| {
                PlayerRecord::new(index, role, derive_salt(master, index), IdentitySecret::generate())
            })
            .collect();

        Ok(Self { players })
    }

    /// Number of players.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// True when the store holds no players.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Look up a player.
    pub fn get(&self, index: PlayerIndex) -> GameResult<&PlayerRecord> {
        self.players.get(index).ok_or(GameError::UnknownPlayer(index))
    }

    /// Iterate over all players in index order.
    pub fn iter(&self) -> impl Iterator<Item = &PlayerRecord> {
        self.players.iter()
    }

    /// Iterate over live players in index order.
    pub fn alive(&self) -> impl Iterator<Item = &PlayerRecord> {
        self.players.iter().filter(|p| p.alive)
    }

    /// Number of live players.
    pub fn alive_count(&self) -> usize {
        self.alive().count()
    }

    /// Identity tree leaves in index order.
    pub fn leaves(&self) -> Vec<Digest> {
        self.players.iter().map(PlayerRecord::leaf).collect()
    }

    /// Role commitments in index order.
    pub fn commitments(&self) -> Vec<Digest> {
        self.players.iter().map(PlayerRecord::commitment).collect()
    }

    /// Record a submission. Re-submitting in the same phase overwrites the
    /// previous target.
    pub fn mark_acted(&mut self, index: PlayerIndex, target: PlayerIndex) -> GameResult<()> {
        let player = self
            .players
            .get_mut(index)
            .ok_or(GameError::UnknownPlayer(index))?;

        if !player.alive {
            return Err(GameError::DeadPlayer(index));
        }

        player.has_acted = true;
        player.pending_target = Some(target);
        Ok(())
    }

    /// Clear every player's per-phase flags.
    pub fn reset_round_flags(&mut self) {
        for player in &mut self.players {
            player.has_acted = false;
            player.pending_target = None;
        }
    }

    /// Mark a player dead.
    pub(crate) fn kill(&mut self, index: PlayerIndex) -> GameResult<()> {
        let player = self
            .players
            .get_mut(index)
            .ok_or(GameError::UnknownPlayer(index))?;
        player.alive = false;
        Ok(())
    }

    /// (live werewolves, live others).
    pub(crate) fn alive_by_team(&self) -> (usize, usize) {
        self.alive().fold((0, 0), |(wolves, others), p| {
            if p.role.is_werewolf() {
                (wolves + 1, others)
            } else {
                (wolves, others + 1)
            }
        })
    }
}
