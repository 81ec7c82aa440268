//! Merkle engine: root computation, inclusion proofs, verification.
//!
//! BLAKE2b-512 throughout. Internal nodes hash the 128-byte concatenation
//! of their children. An odd node at the end of a level is paired with
//! itself. Proofs carry bottom-up siblings only; the verifier recovers
//! orientation from index parity.

use blake2::{Blake2b512, Digest};
use serde::{Deserialize, Serialize};

use crate::digest::Blake2b512Hash;
use crate::error::ProofError;

/// Algorithm label carried in commitments and bundles.
pub const MERKLE_ALGORITHM: &str = "blake2b512";

/// Domain string hashed to produce the empty-tree root.
///
/// This sentinel is part of the on-wire contract: a bundle over a
/// zero-byte artifact commits to exactly this root.
pub const EMPTY_TREE_DOMAIN: &[u8] = b"resethiq:empty";

/// The root of the empty tree: `BLAKE2b-512("resethiq:empty")`.
pub fn empty_root() -> Blake2b512Hash {
    Blake2b512Hash::hash(EMPTY_TREE_DOMAIN)
}

/// An inclusion proof for one leaf.
///
/// `siblings` is the co-path from leaf to root, bottom-up. Orientation at
/// each level is derived from the running index parity, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionProof {
    pub index: u64,
    pub leaf_hash: Blake2b512Hash,
    pub siblings: Vec<Blake2b512Hash>,
}

fn combine(left: &Blake2b512Hash, right: &Blake2b512Hash) -> Blake2b512Hash {
    let mut hasher = Blake2b512::new();
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());
    let mut out = [0u8; 64];
    out.copy_from_slice(&hasher.finalize());
    Blake2b512Hash::from_bytes(out)
}

/// Build the explicit tree levels, leaves at the bottom, root level last.
///
/// An empty leaf set produces a single level holding the sentinel root.
pub fn build_levels(leaves: &[Blake2b512Hash]) -> Vec<Vec<Blake2b512Hash>> {
    if leaves.is_empty() {
        return vec![vec![empty_root()]];
    }

    let mut levels: Vec<Vec<Blake2b512Hash>> = vec![leaves.to_vec()];
    loop {
        let next = {
            let current = levels.last().expect("levels start non-empty");
            if current.len() == 1 {
                break;
            }
            current
                .chunks(2)
                .map(|pair| match pair {
                    [left, right] => combine(left, right),
                    [lone] => combine(lone, lone),
                    _ => unreachable!("chunks(2) yields one or two nodes"),
                })
                .collect()
        };
        levels.push(next);
    }
    levels
}

/// Compute the root over the given leaves.
pub fn merkle_root(leaves: &[Blake2b512Hash]) -> Blake2b512Hash {
    let levels = build_levels(leaves);
    levels.last().expect("levels start non-empty")[0]
}

/// Build the inclusion proof for the leaf at `index`.
pub fn inclusion_proof(
    leaves: &[Blake2b512Hash],
    index: usize,
) -> Result<InclusionProof, ProofError> {
    if leaves.is_empty() {
        return Err(ProofError::EmptyTree);
    }
    if index >= leaves.len() {
        return Err(ProofError::IndexOutOfRange {
            index: index as u64,
            count: leaves.len() as u64,
        });
    }

    let levels = build_levels(leaves);
    let mut siblings = Vec::with_capacity(levels.len() - 1);
    let mut idx = index;

    for level in &levels[..levels.len() - 1] {
        let sibling_idx = if idx % 2 == 0 { idx + 1 } else { idx - 1 };
        // Last node on an odd-sized level is its own sibling.
        let sibling = if sibling_idx < level.len() {
            level[sibling_idx]
        } else {
            level[idx]
        };
        siblings.push(sibling);
        idx /= 2;
    }

    Ok(InclusionProof {
        index: index as u64,
        leaf_hash: leaves[index],
        siblings,
    })
}

/// Verify an inclusion proof against a root.
pub fn verify_inclusion(root: &Blake2b512Hash, proof: &InclusionProof) -> bool {
    let mut node = proof.leaf_hash;
    let mut idx = proof.index;
    for sibling in &proof.siblings {
        node = if idx % 2 == 1 {
            combine(sibling, &node)
        } else {
            combine(&node, sibling)
        };
        idx /= 2;
    }
    node == *root
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaves(n: usize) -> Vec<Blake2b512Hash> {
        (0..n)
            .map(|i| Blake2b512Hash::hash(format!("leaf-{}", i).as_bytes()))
            .collect()
    }

    #[test]
    fn test_empty_root_sentinel() {
        assert_eq!(
            empty_root().to_hex(),
            "38fb1a741cd425e8cbb7f862dd6c0f7f8745150f2bc6f4dcf1ef20b77b0b52a8\
             5f39d5b6bea169b29b623be4dc7cd9c0a23a30bec770f59e75b69eb8c12d5304"
        );
        assert_eq!(merkle_root(&[]), empty_root());
    }

    #[test]
    fn test_single_leaf_root_is_leaf() {
        let l = leaves(1);
        assert_eq!(merkle_root(&l), l[0]);
    }

    #[test]
    fn test_two_leaf_root() {
        let l = leaves(2);
        assert_eq!(merkle_root(&l), combine(&l[0], &l[1]));
    }

    #[test]
    fn test_three_leaf_root_duplicates_last() {
        let l = leaves(3);
        let left = combine(&l[0], &l[1]);
        let right = combine(&l[2], &l[2]);
        assert_eq!(merkle_root(&l), combine(&left, &right));
    }

    #[test]
    fn test_all_proofs_verify_across_sizes() {
        for n in 1..=17 {
            let l = leaves(n);
            let root = merkle_root(&l);
            for i in 0..n {
                let proof = inclusion_proof(&l, i).unwrap();
                assert!(verify_inclusion(&root, &proof), "n={} i={}", n, i);
            }
        }
    }

    #[test]
    fn test_duplication_branch_proof() {
        // Index 2 of a 3-leaf tree is paired with itself at the bottom.
        let l = leaves(3);
        let proof = inclusion_proof(&l, 2).unwrap();
        assert_eq!(proof.siblings[0], l[2]);
        assert!(verify_inclusion(&merkle_root(&l), &proof));
    }

    #[test]
    fn test_tampered_sibling_fails() {
        let l = leaves(8);
        let root = merkle_root(&l);
        let mut proof = inclusion_proof(&l, 5).unwrap();
        let mut bytes = *proof.siblings[1].as_bytes();
        bytes[0] ^= 0x01;
        proof.siblings[1] = Blake2b512Hash::from_bytes(bytes);
        assert!(!verify_inclusion(&root, &proof));
    }

    #[test]
    fn test_tampered_leaf_fails() {
        let l = leaves(4);
        let root = merkle_root(&l);
        let mut proof = inclusion_proof(&l, 0).unwrap();
        proof.leaf_hash = Blake2b512Hash::hash(b"other");
        assert!(!verify_inclusion(&root, &proof));
    }

    #[test]
    fn test_wrong_index_fails() {
        let l = leaves(4);
        let root = merkle_root(&l);
        let mut proof = inclusion_proof(&l, 1).unwrap();
        proof.index = 2;
        assert!(!verify_inclusion(&root, &proof));
    }

    #[test]
    fn test_proof_for_empty_tree_rejected() {
        assert!(matches!(
            inclusion_proof(&[], 0),
            Err(ProofError::EmptyTree)
        ));
    }

    #[test]
    fn test_out_of_range_index_rejected() {
        let l = leaves(3);
        assert!(matches!(
            inclusion_proof(&l, 3),
            Err(ProofError::IndexOutOfRange { index: 3, count: 3 })
        ));
    }

    #[test]
    fn test_proof_siblings_are_bottom_up() {
        let l = leaves(4);
        let proof = inclusion_proof(&l, 0).unwrap();
        assert_eq!(proof.siblings.len(), 2);
        assert_eq!(proof.siblings[0], l[1]);
        assert_eq!(proof.siblings[1], combine(&l[2], &l[3]));
    }
}
