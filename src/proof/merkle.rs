//! Identity Tree
//!
//! Fixed-depth binary Merkle tree over the players' identity leaves.
//! Depth 10 gives room for 1024 players; unused slots hold the zero digest.
//! The tree is built once at game creation and never mutated, so every
//! membership proof is checked against that one committed root.

use serde::{Serialize, Deserialize};

use crate::core::hash::{Digest, DigestWriter, ZERO_DIGEST};
use crate::error::{GameError, GameResult};

/// Depth of the identity tree.
pub const TREE_DEPTH: usize = 10;

/// Number of leaf slots (and so the player cap).
pub const MAX_LEAVES: usize = 1 << TREE_DEPTH;

/// Domain separator for internal nodes.
const NODE_DOMAIN: &[u8] = b"WEREWOLF_IDENTITY_NODE_V1";

/// Which side of the running hash a sibling sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Sibling is the left child; the running hash is on the right.
    Left,
    /// Sibling is the right child; the running hash is on the left.
    Right,
}

/// One level of an authentication path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthStep {
    /// Sibling digest at this level.
    pub sibling: Digest,
    /// Side the sibling is on.
    pub direction: Direction,
}

/// Authentication path from a leaf to the root, leaf level first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthPath {
    /// Exactly `TREE_DEPTH` steps for a well-formed path.
    pub steps: Vec<AuthStep>,
}

impl AuthPath {
    /// Fold the path over a leaf and return the resulting root.
    pub fn compute_root(&self, leaf: &Digest) -> Digest {
        self.steps.iter().fold(*leaf, |current, step| match step.direction {
            Direction::Left => hash_nodes(&step.sibling, &current),
            Direction::Right => hash_nodes(&current, &step.sibling),
        })
    }

    /// Check that `leaf` is a member of the tree committed to by `root`.
    ///
    /// Paths of the wrong length are rejected outright.
    pub fn verify(&self, root: &Digest, leaf: &Digest) -> bool {
        self.steps.len() == TREE_DEPTH && self.compute_root(leaf) == *root
    }
}

/// Immutable fixed-depth identity tree.
#[derive(Clone, Debug)]
pub struct IdentityTree {
    /// All levels, leaves at index 0 and the root alone at index `TREE_DEPTH`.
    levels: Vec<Vec<Digest>>,
    /// Number of real (non-padding) leaves.
    leaf_count: usize,
}

impl IdentityTree {
    /// Build the tree from player leaves in index order.
    pub fn build(leaves: &[Digest]) -> GameResult<Self> {
        if leaves.len() > MAX_LEAVES {
            return Err(GameError::InvalidConfig(format!(
                "{} leaves exceed tree capacity {}",
                leaves.len(),
                MAX_LEAVES
            )));
        }

        let mut current = Vec::with_capacity(MAX_LEAVES);
        current.extend_from_slice(leaves);
        current.resize(MAX_LEAVES, ZERO_DIGEST);

        let mut levels = Vec::with_capacity(TREE_DEPTH + 1);
        while current.len() > 1 {
            let next: Vec<Digest> = current
                .chunks(2)
                .map(|pair| hash_nodes(&pair[0], &pair[1]))
                .collect();
            levels.push(current);
            current = next;
        }
        levels.push(current);

        Ok(Self {
            levels,
            leaf_count: leaves.len(),
        })
    }

    /// Root digest.
    pub fn root(&self) -> Digest {
        self.levels[TREE_DEPTH][0]
    }

    /// Number of real leaves.
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Leaf digest at `index` (zero digest for unused slots).
    pub fn leaf(&self, index: usize) -> GameResult<Digest> {
        self.levels[0]
            .get(index)
            .copied()
            .ok_or(GameError::InvalidIndex { index, limit: MAX_LEAVES })
    }

    /// Authentication path for the leaf at `index`.
    pub fn proof(&self, index: usize) -> GameResult<AuthPath> {
        if index >= MAX_LEAVES {
            return Err(GameError::InvalidIndex { index, limit: MAX_LEAVES });
        }

        let mut steps = Vec::with_capacity(TREE_DEPTH);
        let mut position = index;

        for level in &self.levels[..TREE_DEPTH] {
            let step = if position % 2 == 0 {
                AuthStep { sibling: level[position + 1], direction: Direction::Right }
            } else {
                AuthStep { sibling: level[position - 1], direction: Direction::Left }
            };
            steps.push(step);
            position /= 2;
        }

        Ok(AuthPath { steps })
    }
}

/// Hash two child nodes with domain separation.
fn hash_nodes(left: &Digest, right: &Digest) -> Digest {
    let mut writer = DigestWriter::new(NODE_DOMAIN);
    writer.update_digest(left);
    writer.update_digest(right);
    writer.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hash::hash_bytes;
    use proptest::prelude::*;

    fn leaves(n: usize) -> Vec<Digest> {
        (0..n).map(|i| hash_bytes(format!("leaf_{}", i).as_bytes())).collect()
    }

    #[test]
    fn test_root_determinism() {
        let a = IdentityTree::build(&leaves(8)).unwrap();
        let b = IdentityTree::build(&leaves(8)).unwrap();
        assert_eq!(a.root(), b.root());
    }

    #[test]
    fn test_different_leaves_different_root() {
        let mut changed = leaves(8);
        changed[5] = hash_bytes(b"intruder");

        let a = IdentityTree::build(&leaves(8)).unwrap();
        let b = IdentityTree::build(&changed).unwrap();
        assert_ne!(a.root(), b.root());
    }

    #[test]
    fn test_empty_tree_is_all_zero_slots() {
        let tree = IdentityTree::build(&[]).unwrap();
        assert_eq!(tree.leaf_count(), 0);
        assert_eq!(tree.leaf(0).unwrap(), ZERO_DIGEST);
        assert!(tree.proof(0).unwrap().verify(&tree.root(), &ZERO_DIGEST));
    }

    #[test]
    fn test_proof_has_fixed_depth() {
        let tree = IdentityTree::build(&leaves(3)).unwrap();
        assert_eq!(tree.proof(2).unwrap().steps.len(), TREE_DEPTH);
        assert_eq!(tree.proof(MAX_LEAVES - 1).unwrap().steps.len(), TREE_DEPTH);
    }

    #[test]
    fn test_proof_out_of_bounds() {
        let tree = IdentityTree::build(&leaves(2)).unwrap();
        assert_eq!(
            tree.proof(MAX_LEAVES),
            Err(GameError::InvalidIndex { index: MAX_LEAVES, limit: MAX_LEAVES })
        );
    }

    #[test]
    fn test_too_many_leaves() {
        let result = IdentityTree::build(&vec![ZERO_DIGEST; MAX_LEAVES + 1]);
        assert!(matches!(result, Err(GameError::InvalidConfig(_))));
    }

    #[test]
    fn test_wrong_leaf_fails() {
        let data = leaves(4);
        let tree = IdentityTree::build(&data).unwrap();
        let proof = tree.proof(0).unwrap();

        assert!(proof.verify(&tree.root(), &data[0]));
        assert!(!proof.verify(&tree.root(), &data[1]));
    }

    #[test]
    fn test_stale_root_fails() {
        let data = leaves(4);
        let old = IdentityTree::build(&data[..3]).unwrap();
        let new = IdentityTree::build(&data).unwrap();

        let proof = new.proof(1).unwrap();
        assert!(!proof.verify(&old.root(), &data[1]));
    }

    #[test]
    fn test_truncated_path_fails() {
        let data = leaves(4);
        let tree = IdentityTree::build(&data).unwrap();
        let mut proof = tree.proof(2).unwrap();
        proof.steps.pop();

        assert!(!proof.verify(&tree.root(), &data[2]));
    }

    #[test]
    fn test_flipped_direction_fails() {
        let data = leaves(4);
        let tree = IdentityTree::build(&data).unwrap();
        let mut proof = tree.proof(2).unwrap();
        proof.steps[0].direction = Direction::Left;

        assert!(!proof.verify(&tree.root(), &data[2]));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_every_proof_reconstructs_root(n in 1usize..64) {
            let data = leaves(n);
            let tree = IdentityTree::build(&data).unwrap();
            let root = tree.root();

            for (i, leaf) in data.iter().enumerate() {
                let proof = tree.proof(i).unwrap();
                prop_assert_eq!(proof.compute_root(leaf), root);
                prop_assert!(proof.verify(&root, leaf));
            }
        }
    }
}
