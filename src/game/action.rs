//! Anonymous Action Submission
//!
//! Builds the message a live player's action is sent to the verifier as:
//! a sealed payload, a membership proof against the committed identity
//! root, the identity secret as witness and a per-slot nullifier.
//!
//! The message is not anonymous on its own. The path directions spell out
//! the leaf index and the identity secret hashes to a registered public
//! key, so whoever sees the witness knows who acted. Only the nullifier and
//! the sealed payload are meant to be public; hiding the rest needs a proof
//! backend that checks the witness without disclosing it.

use rand::RngCore;
use serde::{Serialize, Deserialize};

use crate::core::hash::{Digest, hash_with_domain};
use crate::error::{GameError, GameResult};
use crate::game::state::{GameId, Phase, PlayerIndex, PlayerRecord};
use crate::proof::commitment::IdentitySecret;
use crate::proof::merkle::{AuthPath, IdentityTree};

/// Domain separator for sealed payloads.
const PAYLOAD_DOMAIN: &[u8] = b"WEREWOLF_ACTION_PAYLOAD_V1";

/// Which sub-protocol an action goes through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    /// Submitted during Night.
    NightAction,
    /// Submitted during Day.
    DayVote,
}

impl ActionKind {
    /// Action kind accepted in `phase`.
    pub fn for_phase(phase: Phase) -> GameResult<Self> {
        match phase {
            Phase::Night => Ok(ActionKind::NightAction),
            Phase::Day => Ok(ActionKind::DayVote),
            other => Err(GameError::InvalidPhase { expected: "Night or Day", actual: other }),
        }
    }

    /// Phase this kind belongs to.
    pub fn phase(self) -> Phase {
        match self {
            ActionKind::NightAction => Phase::Night,
            ActionKind::DayVote => Phase::Day,
        }
    }
}

/// Plaintext of an action. Only its seal leaves the node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPayload {
    /// Target player.
    pub target: u32,
    /// Fresh per submission so equal targets seal differently.
    pub nonce: [u8; 32],
}

impl ActionPayload {
    /// Payload for `target` with a fresh random nonce.
    pub fn fresh(target: PlayerIndex) -> Self {
        let mut nonce = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut nonce);
        Self {
            target: target as u32,
            nonce,
        }
    }

    /// Binding digest of the payload.
    pub fn seal(&self) -> GameResult<Digest> {
        let bytes = bincode::serialize(self)?;
        Ok(hash_with_domain(PAYLOAD_DOMAIN, &bytes))
    }
}

/// One anonymous submission as the verifier sees it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnonymousAction {
    /// Night action or day vote.
    pub kind: ActionKind,
    /// Round the action belongs to.
    pub round: u32,
    /// Seal of the [`ActionPayload`].
    pub sealed_payload: Digest,
    /// Path from the submitter's leaf to the committed root.
    pub membership_proof: AuthPath,
    /// Witness for the membership proof and nullifier.
    pub identity_secret: IdentitySecret,
    /// Per-slot nullifier; re-submissions reuse it.
    pub nullifier: Digest,
}

impl AnonymousAction {
    /// Build the submission for `player` targeting `target`.
    pub(crate) fn build(
        game_id: &GameId,
        round: u32,
        kind: ActionKind,
        player: &PlayerRecord,
        tree: &IdentityTree,
        payload: &ActionPayload,
    ) -> GameResult<Self> {
        let identity_secret = player.identity_secret().clone();
        let nullifier = identity_secret.nullifier(game_id, round, kind.phase());

        Ok(Self {
            kind,
            round,
            sealed_payload: payload.seal()?,
            membership_proof: tree.proof(player.index())?,
            identity_secret,
            nullifier,
        })
    }

    /// Check the membership proof against `root` and the nullifier against
    /// the witness.
    pub fn authenticate(&self, game_id: &GameId, root: &Digest) -> bool {
        let leaf = self.identity_secret.leaf();
        self.membership_proof.verify(root, &leaf)
            && self.nullifier == self.identity_secret.nullifier(game_id, self.round, self.kind.phase())
    }
}

/// Outcome of a submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionReceipt {
    /// Accepted by the verifier and recorded locally.
    Recorded {
        /// Sub-protocol used.
        kind: ActionKind,
        /// Nullifier the verifier keyed it under.
        nullifier: Digest,
    },
    /// Submitter is dead; nothing happened.
    Ignored {
        /// Dead submitter.
        index: PlayerIndex,
    },
}

impl ActionReceipt {
    /// Was the action recorded?
    pub fn is_recorded(&self) -> bool {
        matches!(self, ActionReceipt::Recorded { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::{PlayerStore, RoleOrder};
    use crate::proof::commitment::MasterSecret;

    const GAME: GameId = [3; 32];

    fn setup() -> (PlayerStore, IdentityTree) {
        let master = MasterSecret::from_bytes([1; 32]);
        let store = PlayerStore::create_players(6, 2, RoleOrder::Sequential, &master, &GAME).unwrap();
        let tree = IdentityTree::build(&store.leaves()).unwrap();
        (store, tree)
    }

    #[test]
    fn test_kind_for_phase() {
        assert_eq!(ActionKind::for_phase(Phase::Night), Ok(ActionKind::NightAction));
        assert_eq!(ActionKind::for_phase(Phase::Day), Ok(ActionKind::DayVote));
        assert!(matches!(
            ActionKind::for_phase(Phase::Lobby),
            Err(GameError::InvalidPhase { actual: Phase::Lobby, .. })
        ));
        assert!(ActionKind::for_phase(Phase::Finished).is_err());
    }

    #[test]
    fn test_fresh_payloads_seal_differently() {
        let a = ActionPayload::fresh(2);
        let b = ActionPayload::fresh(2);
        assert_ne!(a.seal().unwrap(), b.seal().unwrap());
        assert_eq!(a.seal().unwrap(), a.clone().seal().unwrap());
    }

    #[test]
    fn test_built_action_authenticates() {
        let (store, tree) = setup();
        let player = store.get(4).unwrap();
        let action = AnonymousAction::build(
            &GAME, 1, ActionKind::DayVote, player, &tree, &ActionPayload::fresh(0),
        )
        .unwrap();

        assert!(action.authenticate(&GAME, &tree.root()));
        assert_eq!(action.membership_proof.steps.len(), crate::proof::merkle::TREE_DEPTH);
    }

    #[test]
    fn test_stale_root_rejected() {
        let (store, tree) = setup();
        let other = IdentityTree::build(&store.leaves()[..5]).unwrap();
        let action = AnonymousAction::build(
            &GAME, 1, ActionKind::NightAction, store.get(0).unwrap(), &tree, &ActionPayload::fresh(3),
        )
        .unwrap();

        assert!(!action.authenticate(&GAME, &other.root()));
    }

    #[test]
    fn test_tampered_nullifier_rejected() {
        let (store, tree) = setup();
        let mut action = AnonymousAction::build(
            &GAME, 1, ActionKind::NightAction, store.get(0).unwrap(), &tree, &ActionPayload::fresh(3),
        )
        .unwrap();
        action.round = 2;

        assert!(!action.authenticate(&GAME, &tree.root()));
    }

    #[test]
    fn test_resubmission_shares_nullifier() {
        let (store, tree) = setup();
        let player = store.get(1).unwrap();
        let first = AnonymousAction::build(
            &GAME, 2, ActionKind::NightAction, player, &tree, &ActionPayload::fresh(3),
        )
        .unwrap();
        let second = AnonymousAction::build(
            &GAME, 2, ActionKind::NightAction, player, &tree, &ActionPayload::fresh(4),
        )
        .unwrap();

        assert_eq!(first.nullifier, second.nullifier);
        assert_ne!(first.sealed_payload, second.sealed_payload);
    }
}
