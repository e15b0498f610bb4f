//! Game Engine
//!
//! One game as the trusted node runs it. The engine owns the player store
//! and identity tree, drives the Lobby → Night ⇄ Day → Finished machine
//! and mirrors every state change to the [`Verifier`].
//!
//! Every mutating operation plans its outcome first, gets the verifier to
//! accept it, and only then applies it locally. A rejected call leaves the
//! game exactly as it was.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Deserialize};
use tracing::{debug, info, warn};

use crate::core::hash::{short_hex, Digest};
use crate::error::{GameError, GameResult};
use crate::game::action::{ActionKind, ActionPayload, ActionReceipt, AnonymousAction};
use crate::game::events::{events_to_json, GameEvent, GameEventData};
use crate::game::resolve::{check_winner, plan_day, plan_night, DayOutcome, NightOutcome};
use crate::game::state::{
    GameId, Phase, PlayerIndex, PlayerStore, Role, RoleOrder, Winner,
};
use crate::proof::commitment::{check_fairness, opens_to, MasterSecret, Salt};
use crate::proof::merkle::{AuthPath, IdentityTree, MAX_LEAVES};
use crate::proof::verify::{
    DayAttestation, GameRegistration, NightAttestation, PlayerConfig, RoleOpening, Verifier,
};

// =============================================================================
// CONFIG
// =============================================================================

/// Per-game configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Number of players (1..=1024).
    pub player_count: usize,
    /// Number of werewolves, strictly below `player_count`.
    pub werewolf_count: usize,
    /// Role layout over indices.
    pub role_order: RoleOrder,
    /// Finish the game automatically when a side has won.
    pub end_on_win: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            player_count: 7,
            werewolf_count: 2,
            role_order: RoleOrder::Shuffled,
            end_on_win: true,
        }
    }
}

impl GameConfig {
    /// Config with the given counts and default options.
    pub fn new(player_count: usize, werewolf_count: usize) -> Self {
        Self {
            player_count,
            werewolf_count,
            ..Self::default()
        }
    }

    /// Check the counts.
    pub fn validate(&self) -> GameResult<()> {
        if self.player_count == 0 || self.player_count > MAX_LEAVES {
            return Err(GameError::InvalidConfig(format!(
                "player count {} outside 1..={}",
                self.player_count, MAX_LEAVES
            )));
        }
        if self.werewolf_count >= self.player_count {
            return Err(GameError::InvalidConfig(format!(
                "werewolf count {} must be below player count {}",
                self.werewolf_count, self.player_count
            )));
        }
        Ok(())
    }
}

// =============================================================================
// GAME
// =============================================================================

/// A single game driven by the trusted node.
pub struct Game {
    id: GameId,
    config: GameConfig,
    phase: Phase,
    round: u32,
    players: PlayerStore,
    tree: IdentityTree,
    /// Root registered with the verifier. Never changes.
    committed_root: Digest,
    role_commitments: Vec<Digest>,
    master_commitment: Digest,
    admin_key: Digest,
    revealed: BTreeMap<PlayerIndex, Role>,
    winner: Option<Winner>,
    events: Vec<GameEvent>,
    verifier: Arc<dyn Verifier>,
}

impl Game {
    /// Create a game in `Lobby`: assign roles, commit to them and build the
    /// identity tree. Nothing is sent to the verifier until [`Game::start`].
    pub fn create(
        id: GameId,
        config: GameConfig,
        master: &MasterSecret,
        admin_key: Digest,
        verifier: Arc<dyn Verifier>,
    ) -> GameResult<Self> {
        config.validate()?;

        let players = PlayerStore::create_players(
            config.player_count,
            config.werewolf_count,
            config.role_order,
            master,
            &id,
        )?;
        let tree = IdentityTree::build(&players.leaves())?;
        let committed_root = tree.root();
        let role_commitments = players.commitments();

        debug!(
            "Created game {} with {} players, root {}",
            short_hex(&id),
            players.len(),
            short_hex(&committed_root)
        );

        Ok(Self {
            id,
            config,
            phase: Phase::Lobby,
            round: 0,
            players,
            tree,
            committed_root,
            role_commitments,
            master_commitment: master.commitment(),
            admin_key,
            revealed: BTreeMap::new(),
            winner: None,
            events: Vec::new(),
            verifier,
        })
    }

    /// Public data the verifier is given at registration.
    pub fn registration(&self) -> GameRegistration {
        GameRegistration {
            game_id: self.id,
            admin_key: self.admin_key,
            tree_root: self.committed_root,
            master_commitment: self.master_commitment,
            players: self
                .players
                .iter()
                .map(|p| PlayerConfig {
                    index: p.index(),
                    role_commitment: self.role_commitments[p.index()],
                    public_key: p.public_key(),
                })
                .collect(),
            player_count: self.config.player_count,
            werewolf_count: self.config.werewolf_count,
        }
    }

    /// Register with the verifier and enter the first night.
    pub fn start(&mut self) -> GameResult<()> {
        self.require_phase(Phase::Lobby)?;

        self.verifier.create_game(&self.registration())?;

        self.push_event(GameEventData::GameStarted {
            tree_root: self.committed_root,
            player_count: self.players.len(),
        });
        self.phase = Phase::Night;

        info!("Game {} started with {} players", short_hex(&self.id), self.players.len());
        Ok(())
    }

    // =========================================================================
    // ACTIONS
    // =========================================================================

    /// Submit `player`'s action for the current phase.
    ///
    /// Dead players are ignored silently. The action reaches the verifier
    /// keyed by nullifier, not index; only after it is accepted does the
    /// player count as having acted. Re-submitting in the same phase replaces the target.
    pub fn submit_action(
        &mut self,
        player: PlayerIndex,
        target: PlayerIndex,
    ) -> GameResult<ActionReceipt> {
        let record = self.players.get(player)?;
        if !record.is_alive() {
            debug!("Ignoring action from dead player {}", player);
            return Ok(ActionReceipt::Ignored { index: player });
        }

        let kind = ActionKind::for_phase(self.phase)?;
        if target >= self.players.len() {
            return Err(GameError::InvalidIndex {
                index: target,
                limit: self.players.len(),
            });
        }

        let payload = ActionPayload::fresh(target);
        let action = AnonymousAction::build(&self.id, self.round, kind, record, &self.tree, &payload)?;

        if !action.authenticate(&self.id, &self.committed_root) {
            warn!("Membership proof for game {} failed local check", short_hex(&self.id));
            return Err(GameError::InvalidMembershipProof);
        }

        match kind {
            ActionKind::NightAction => self.verifier.night_action(&self.id, &action)?,
            ActionKind::DayVote => self.verifier.vote_day(&self.id, &action)?,
        }

        self.players.mark_acted(player, target)?;
        self.push_event(GameEventData::ActionAccepted {
            kind,
            nullifier: action.nullifier,
        });

        debug!("Accepted {:?} under nullifier {}", kind, short_hex(&action.nullifier));
        Ok(ActionReceipt::Recorded {
            kind,
            nullifier: action.nullifier,
        })
    }

    // =========================================================================
    // RESOLUTION
    // =========================================================================

    /// Resolve the night: kill the first werewolf's chosen target, advance
    /// the round and move to Day (or Finished when a side has won).
    ///
    /// The whole resolution, winner included, is one verifier call.
    pub fn resolve_night(&mut self) -> GameResult<NightOutcome> {
        self.require_phase(Phase::Night)?;

        let outcome = plan_night(&self.players, self.round);
        let winner = self.pending_winner(outcome.victim);

        let attestation = NightAttestation {
            new_round: outcome.new_round,
            victim: outcome.victim,
            tree_root: self.committed_root,
            winner,
        };
        self.verifier.resolve_night_phase(&self.id, &attestation)?;

        self.push_event(GameEventData::NightResolved { victim: outcome.victim });
        if let Some(victim) = outcome.victim {
            self.players.kill(victim)?;
        }
        self.round = outcome.new_round;
        self.players.reset_round_flags();
        self.phase = Phase::Day;

        info!(
            "Night resolved in game {}: round {}, victim {:?}",
            short_hex(&self.id),
            self.round,
            outcome.victim
        );

        if let Some(winner) = winner {
            self.finish(Some(winner));
        }
        Ok(outcome)
    }

    /// Resolve the day: eliminate the player with strictly the most votes,
    /// open their role commitment and move to Night (or Finished).
    ///
    /// A player whose role was already revealed is not opened again.
    pub fn resolve_day(&mut self) -> GameResult<DayOutcome> {
        self.require_phase(Phase::Day)?;

        let outcome = plan_day(&self.players);

        #[cfg(feature = "debug-tracing")]
        debug!("Day tally in game {}: {:?}", short_hex(&self.id), outcome.tally);

        let opening = match outcome.eliminated {
            Some(index) if !self.revealed.contains_key(&index) => {
                let record = self.players.get(index)?;
                let opening = RoleOpening {
                    role: record.role(),
                    salt: *record.salt(),
                };
                self.check_opening(index, opening.role, &opening.salt)?;
                Some(opening)
            }
            _ => None,
        };
        let winner = self.pending_winner(outcome.eliminated);

        self.verifier.resolve_day_phase(&self.id, &DayAttestation {
            eliminated: outcome.eliminated,
            opening,
            winner,
        })?;

        self.push_event(GameEventData::DayResolved { eliminated: outcome.eliminated });
        if let Some(index) = outcome.eliminated {
            self.players.kill(index)?;
            if let Some(opening) = opening {
                self.record_reveal(index, opening.role);
            }
        }
        self.players.reset_round_flags();
        self.phase = Phase::Night;

        info!(
            "Day resolved in game {}: eliminated {:?}",
            short_hex(&self.id),
            outcome.eliminated
        );

        if let Some(winner) = winner {
            self.finish(Some(winner));
        }
        Ok(outcome)
    }

    // =========================================================================
    // COMMITMENTS
    // =========================================================================

    /// Publicly open `index`'s role commitment with the stored role and salt.
    ///
    /// Opening an already revealed role returns it without contacting the
    /// verifier again.
    pub fn reveal_role(&mut self, index: PlayerIndex) -> GameResult<Role> {
        self.require_active()?;
        let record = self.players.get(index)?;
        let (role, salt) = (record.role(), *record.salt());
        self.open_role(index, role, &salt)
    }

    /// Publicly open `index`'s role commitment with a caller-supplied
    /// opening. Fails with `CommitmentMismatch` when the opening is not the
    /// one committed to at creation.
    pub fn open_role(&mut self, index: PlayerIndex, role: Role, salt: &Salt) -> GameResult<Role> {
        self.require_active()?;
        self.players.get(index)?;

        if let Some(&revealed) = self.revealed.get(&index) {
            if revealed == role {
                return Ok(revealed);
            }
        }

        self.check_opening(index, role, salt)?;
        self.verifier.reveal_player_role(&self.id, index, role, salt)?;
        self.record_reveal(index, role);

        Ok(role)
    }

    /// Audit: was `claimed` the role derived from `master` for `index`?
    ///
    /// Checked locally against the commitments published at creation, so
    /// it works in every phase, including `Finished`.
    pub fn verify_fairness(&self, master: &MasterSecret, index: PlayerIndex, claimed: Role) -> bool {
        self.role_commitments
            .get(index)
            .is_some_and(|commitment| check_fairness(commitment, master, index, claimed))
    }

    /// End the game early. Requires the master secret.
    pub fn force_end_game(&mut self, master: &MasterSecret) -> GameResult<()> {
        if self.phase == Phase::Finished {
            return Err(GameError::InvalidPhase {
                expected: "Lobby, Night or Day",
                actual: self.phase,
            });
        }
        if master.commitment() != self.master_commitment {
            warn!("Rejected force end of game {}: bad master secret", short_hex(&self.id));
            return Err(GameError::Unauthorized);
        }

        // A Lobby game was never registered.
        if self.phase != Phase::Lobby {
            self.verifier.force_end_game(&self.id, master)?;
        }

        self.finish(None);
        Ok(())
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Game identifier.
    pub fn id(&self) -> &GameId {
        &self.id
    }

    /// Game configuration.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current round.
    pub fn round(&self) -> u32 {
        self.round
    }

    /// (phase, round).
    pub fn state(&self) -> (Phase, u32) {
        (self.phase, self.round)
    }

    /// (phase, round) as the verifier has attested it.
    pub fn attested_state(&self) -> GameResult<(Phase, u32)> {
        Ok(self.verifier.get_game_state(&self.id)?)
    }

    /// Number of players.
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Is `index` alive?
    pub fn is_alive(&self, index: PlayerIndex) -> GameResult<bool> {
        Ok(self.players.get(index)?.is_alive())
    }

    /// Has `index` acted in the current phase?
    pub fn has_acted(&self, index: PlayerIndex) -> GameResult<bool> {
        Ok(self.players.get(index)?.has_acted())
    }

    /// Live player indices in ascending order.
    pub fn alive_players(&self) -> Vec<PlayerIndex> {
        self.players.alive().map(|p| p.index()).collect()
    }

    /// Published role commitment of `index`.
    pub fn role_commitment(&self, index: PlayerIndex) -> GameResult<Digest> {
        self.role_commitments
            .get(index)
            .copied()
            .ok_or(GameError::UnknownPlayer(index))
    }

    /// Role of `index`, if it has been publicly revealed.
    pub fn revealed_role(&self, index: PlayerIndex) -> Option<Role> {
        self.revealed.get(&index).copied()
    }

    /// Identity tree root registered with the verifier.
    pub fn tree_root(&self) -> Digest {
        self.committed_root
    }

    /// Commitment to the master secret.
    pub fn master_commitment(&self) -> Digest {
        self.master_commitment
    }

    /// Membership proof for `index`.
    pub fn membership_proof(&self, index: PlayerIndex) -> GameResult<AuthPath> {
        self.players.get(index)?;
        self.tree.proof(index)
    }

    /// Winner, once a win condition has finished the game.
    pub fn winner(&self) -> Option<Winner> {
        self.winner
    }

    /// Public event log.
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Public event log as JSON.
    pub fn export_events_json(&self) -> GameResult<String> {
        events_to_json(&self.events).map_err(|e| GameError::Encoding(e.to_string()))
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn require_phase(&self, expected: Phase) -> GameResult<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(GameError::InvalidPhase {
                expected: expected.name(),
                actual: self.phase,
            })
        }
    }

    fn require_active(&self) -> GameResult<()> {
        if self.phase.is_active() {
            Ok(())
        } else {
            Err(GameError::InvalidPhase {
                expected: "Night or Day",
                actual: self.phase,
            })
        }
    }

    fn check_opening(&self, index: PlayerIndex, role: Role, salt: &Salt) -> GameResult<()> {
        let commitment = self.role_commitment(index)?;
        if opens_to(&commitment, role, salt) {
            Ok(())
        } else {
            warn!("Opening for player {} does not match its commitment", index);
            Err(GameError::CommitmentMismatch { index })
        }
    }

    fn pending_winner(&self, dying: Option<PlayerIndex>) -> Option<Winner> {
        if self.config.end_on_win {
            check_winner(&self.players, dying)
        } else {
            None
        }
    }

    fn record_reveal(&mut self, index: PlayerIndex, role: Role) {
        self.revealed.insert(index, role);
        self.push_event(GameEventData::RoleRevealed { index, role });
    }

    fn finish(&mut self, winner: Option<Winner>) {
        self.push_event(GameEventData::GameFinished { winner });
        self.winner = winner;
        self.phase = Phase::Finished;
        info!("Game {} finished, winner {:?}", short_hex(&self.id), winner);
    }

    fn push_event(&mut self, data: GameEventData) {
        self.events.push(GameEvent::new(self.round, self.phase, data));
    }
}

impl fmt::Debug for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Game")
            .field("id", &short_hex(&self.id))
            .field("phase", &self.phase)
            .field("round", &self.round)
            .field("alive", &self.players.alive_count())
            .field("winner", &self.winner)
            .finish_non_exhaustive()
    }
}
