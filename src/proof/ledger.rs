//! In-Memory Ledger
//!
//! Reference [`Verifier`] that keeps the public side of every game in
//! memory. It performs the checks a real circuit/contract pair would:
//! membership proofs against the registered root, nullifier binding,
//! role openings against registered commitments and the master secret
//! commitment.
//!
//! It is not anonymous: actions arrive with the witness in the clear, so
//! the identity secret and the path directions both point at a player
//! index. Submitter anonymity needs a proof backend that keeps the
//! witness private and only exposes the root and nullifier.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use crate::core::hash::{short_hex, Digest};
use crate::game::action::{ActionKind, AnonymousAction};
use crate::game::state::{GameId, Phase, PlayerIndex, Role, Winner};
use crate::proof::commitment::{check_fairness, opens_to, MasterSecret, Salt};
use crate::proof::merkle::MAX_LEAVES;
use crate::proof::verify::{
    DayAttestation, GameRegistration, NightAttestation, Verifier, VerifierError,
};

/// Public record of one game.
#[derive(Clone, Debug)]
pub struct LedgerGame {
    /// What was published at creation.
    pub registration: GameRegistration,
    /// Attested phase.
    pub phase: Phase,
    /// Attested round.
    pub round: u32,
    /// Sealed payloads of the current phase, keyed by nullifier.
    pub submissions: BTreeMap<Digest, (ActionKind, Digest)>,
    /// Publicly opened roles.
    pub revealed: BTreeMap<PlayerIndex, Role>,
    /// Night victims and day eliminations in attestation order.
    pub deaths: Vec<PlayerIndex>,
    /// Winner, if a win condition ended the game.
    pub winner: Option<Winner>,
}

/// In-memory reference verifier.
#[derive(Default)]
pub struct InMemoryLedger {
    games: Mutex<BTreeMap<GameId, LedgerGame>>,
}

impl InMemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a game's public record.
    pub fn game(&self, game_id: &GameId) -> Option<LedgerGame> {
        self.lock().ok()?.get(game_id).cloned()
    }

    /// Number of registered games.
    pub fn game_count(&self) -> usize {
        self.lock().map(|games| games.len()).unwrap_or(0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<GameId, LedgerGame>>, VerifierError> {
        self.games
            .lock()
            .map_err(|_| VerifierError::Unavailable("ledger lock poisoned".into()))
    }

    /// Run `f` on a registered game.
    fn with_game<T, F>(&self, game_id: &GameId, f: F) -> Result<T, VerifierError>
    where
        F: FnOnce(&mut LedgerGame) -> Result<T, VerifierError>,
    {
        let mut games = self.lock()?;
        let game = games
            .get_mut(game_id)
            .ok_or_else(|| VerifierError::UnknownGame(hex::encode(game_id)))?;
        f(game)
    }

    fn accept_action(
        &self,
        game_id: &GameId,
        action: &AnonymousAction,
        expected: ActionKind,
    ) -> Result<(), VerifierError> {
        self.with_game(game_id, |game| {
            require_phase(game, expected.phase())?;
            if action.kind != expected {
                return Err(VerifierError::StateMismatch(format!(
                    "{:?} submitted as {:?}",
                    action.kind, expected
                )));
            }
            if action.round != game.round {
                return Err(VerifierError::StateMismatch(format!(
                    "action for round {}, ledger at round {}",
                    action.round, game.round
                )));
            }
            if !action.authenticate(game_id, &game.registration.tree_root) {
                return Err(VerifierError::InvalidMembershipProof);
            }

            // Same nullifier replaces the earlier submission.
            game.submissions
                .insert(action.nullifier, (action.kind, action.sealed_payload));
            debug!("Ledger accepted {:?} {}", action.kind, short_hex(&action.nullifier));
            Ok(())
        })
    }
}

fn require_phase(game: &LedgerGame, expected: Phase) -> Result<(), VerifierError> {
    if game.phase == expected {
        Ok(())
    } else {
        Err(VerifierError::StateMismatch(format!(
            "expected {}, ledger is in {}",
            expected, game.phase
        )))
    }
}

fn require_active(game: &LedgerGame) -> Result<(), VerifierError> {
    if game.phase.is_active() {
        Ok(())
    } else {
        Err(VerifierError::StateMismatch(format!("game is in {}", game.phase)))
    }
}

fn player_commitment(game: &LedgerGame, index: PlayerIndex) -> Result<Digest, VerifierError> {
    game.registration
        .players
        .get(index)
        .map(|p| p.role_commitment)
        .ok_or_else(|| VerifierError::InvalidConfig(format!("no player {}", index)))
}

fn finish_on_winner(game: &mut LedgerGame, winner: Option<Winner>) {
    if winner.is_some() {
        game.winner = winner;
        game.phase = Phase::Finished;
    }
}

fn validate_registration(registration: &GameRegistration) -> Result<(), VerifierError> {
    let count = registration.player_count;
    if count == 0 || count > MAX_LEAVES {
        return Err(VerifierError::InvalidConfig(format!(
            "player count {} outside 1..={}",
            count, MAX_LEAVES
        )));
    }
    if registration.werewolf_count >= count {
        return Err(VerifierError::InvalidConfig(format!(
            "werewolf count {} must be below player count {}",
            registration.werewolf_count, count
        )));
    }
    if registration.players.len() != count {
        return Err(VerifierError::InvalidConfig(format!(
            "{} player configs for {} players",
            registration.players.len(),
            count
        )));
    }
    if registration.players.iter().enumerate().any(|(i, p)| p.index != i) {
        return Err(VerifierError::InvalidConfig("player configs out of index order".into()));
    }
    Ok(())
}

impl Verifier for InMemoryLedger {
    fn create_game(&self, registration: &GameRegistration) -> Result<(), VerifierError> {
        validate_registration(registration)?;

        let mut games = self.lock()?;
        if let Some(existing) = games.get(&registration.game_id) {
            if !existing.phase.allows_new_game() {
                return Err(VerifierError::InvalidConfig(format!(
                    "game {} is still in {}",
                    hex::encode(registration.game_id),
                    existing.phase
                )));
            }
        }

        games.insert(registration.game_id, LedgerGame {
            registration: registration.clone(),
            phase: Phase::Night,
            round: 0,
            submissions: BTreeMap::new(),
            revealed: BTreeMap::new(),
            deaths: Vec::new(),
            winner: None,
        });
        debug!("Ledger registered game {}", short_hex(&registration.game_id));
        Ok(())
    }

    fn night_action(&self, game_id: &GameId, action: &AnonymousAction) -> Result<(), VerifierError> {
        self.accept_action(game_id, action, ActionKind::NightAction)
    }

    fn vote_day(&self, game_id: &GameId, action: &AnonymousAction) -> Result<(), VerifierError> {
        self.accept_action(game_id, action, ActionKind::DayVote)
    }

    fn resolve_night_phase(
        &self,
        game_id: &GameId,
        attestation: &NightAttestation,
    ) -> Result<(), VerifierError> {
        self.with_game(game_id, |game| {
            require_phase(game, Phase::Night)?;
            if attestation.new_round != game.round + 1 {
                return Err(VerifierError::StateMismatch(format!(
                    "new round {} after round {}",
                    attestation.new_round, game.round
                )));
            }
            if attestation.tree_root != game.registration.tree_root {
                return Err(VerifierError::StateMismatch("identity root changed".into()));
            }

            game.deaths.extend(attestation.victim);
            game.round = attestation.new_round;
            game.phase = Phase::Day;
            game.submissions.clear();
            finish_on_winner(game, attestation.winner);
            Ok(())
        })
    }

    fn resolve_day_phase(
        &self,
        game_id: &GameId,
        attestation: &DayAttestation,
    ) -> Result<(), VerifierError> {
        self.with_game(game_id, |game| {
            require_phase(game, Phase::Day)?;

            let reveal = match (attestation.eliminated, attestation.opening) {
                (Some(index), Some(opening)) => {
                    let commitment = player_commitment(game, index)?;
                    if !opens_to(&commitment, opening.role, &opening.salt) {
                        return Err(VerifierError::CommitmentMismatch { index });
                    }
                    Some((index, opening.role))
                }
                (Some(index), None) if game.revealed.contains_key(&index) => None,
                (Some(index), None) => {
                    return Err(VerifierError::StateMismatch(format!(
                        "elimination of {} without an opening",
                        index
                    )));
                }
                (None, Some(_)) => {
                    return Err(VerifierError::StateMismatch("opening without elimination".into()));
                }
                (None, None) => None,
            };

            game.deaths.extend(attestation.eliminated);
            if let Some((index, role)) = reveal {
                game.revealed.insert(index, role);
            }
            game.phase = Phase::Night;
            game.submissions.clear();
            finish_on_winner(game, attestation.winner);
            Ok(())
        })
    }

    fn reveal_player_role(
        &self,
        game_id: &GameId,
        index: PlayerIndex,
        role: Role,
        salt: &Salt,
    ) -> Result<(), VerifierError> {
        self.with_game(game_id, |game| {
            require_active(game)?;
            let commitment = player_commitment(game, index)?;

            if !opens_to(&commitment, role, salt) {
                return Err(VerifierError::CommitmentMismatch { index });
            }

            game.revealed.insert(index, role);
            Ok(())
        })
    }

    fn verify_fairness(
        &self,
        game_id: &GameId,
        master: &MasterSecret,
        index: PlayerIndex,
        role: Role,
    ) -> bool {
        self.with_game(game_id, |game| {
            Ok(game
                .registration
                .players
                .get(index)
                .is_some_and(|p| check_fairness(&p.role_commitment, master, index, role)))
        })
        .unwrap_or(false)
    }

    fn force_end_game(&self, game_id: &GameId, master: &MasterSecret) -> Result<(), VerifierError> {
        self.with_game(game_id, |game| {
            if game.phase == Phase::Finished {
                return Err(VerifierError::StateMismatch("game already finished".into()));
            }
            if master.commitment() != game.registration.master_commitment {
                return Err(VerifierError::Unauthorized);
            }
            game.phase = Phase::Finished;
            game.submissions.clear();
            Ok(())
        })
    }

    fn get_game_state(&self, game_id: &GameId) -> Result<(Phase, u32), VerifierError> {
        self.with_game(game_id, |game| Ok((game.phase, game.round)))
    }
}
