//! Proof Verification
//!
//! Stateless checks an auditor runs with nothing but a trusted root and the
//! proof it was handed. Left/right placement of every sibling is derived from
//! the leaf index and tree size, never taken from the prover. A failed check
//! is a plain `false`; malformed proofs (wrong hash count, impossible sizes)
//! are rejected the same way.

use tracing::debug;

use crate::merkle::hasher::{empty_root, leaf_hash, node_hash, Digest};
use crate::merkle::proof::{
    consistency_path_len, inclusion_path_len, ConsistencyProof, InclusionProof,
};

/// Check that `event` sits at `leaf_index` in the tree committed to by `expected_root`
pub fn verify_inclusion(
    event: &[u8],
    leaf_index: u64,
    proof: &InclusionProof,
    expected_root: &Digest,
) -> bool {
    if proof.leaf_index != leaf_index {
        debug!(
            "Inclusion rejected: proof is for leaf {}, expected {}",
            proof.leaf_index, leaf_index
        );
        return false;
    }
    verify_inclusion_hash(&leaf_hash(event), proof, expected_root)
}

/// Same as [`verify_inclusion`] for a caller that already holds the leaf hash
pub fn verify_inclusion_hash(leaf: &Digest, proof: &InclusionProof, expected_root: &Digest) -> bool {
    match root_from_inclusion_path(leaf, proof.leaf_index, proof.tree_size, &proof.path) {
        Some(root) if root == *expected_root => true,
        Some(root) => {
            debug!(
                "Inclusion rejected: computed root {} does not match {}",
                root, expected_root
            );
            false
        }
        None => false,
    }
}

/// Fold a leaf hash with its audit path, `None` if the path is malformed
pub fn root_from_inclusion_path(
    leaf: &Digest,
    leaf_index: u64,
    tree_size: u64,
    path: &[Digest],
) -> Option<Digest> {
    if leaf_index >= tree_size {
        debug!(
            "Inclusion rejected: leaf {} outside tree size {}",
            leaf_index, tree_size
        );
        return None;
    }
    let expected_len = inclusion_path_len(leaf_index, tree_size);
    if path.len() != expected_len {
        debug!(
            "Inclusion rejected: {} hashes, expected {}",
            path.len(),
            expected_len
        );
        return None;
    }

    let mut index = leaf_index;
    let mut last = tree_size - 1;
    let mut root = *leaf;
    for sibling in path {
        if last == 0 {
            return None;
        }
        if index & 1 == 1 || index == last {
            root = node_hash(sibling, &root);
            // Right edge: skip levels where this node has no right sibling
            if index & 1 == 0 {
                while index & 1 == 0 && index != 0 {
                    index >>= 1;
                    last >>= 1;
                }
            }
        } else {
            root = node_hash(&root, sibling);
        }
        index >>= 1;
        last >>= 1;
    }

    (last == 0).then_some(root)
}

/// Check that `new_root` commits to an append-only extension of `old_root`
pub fn verify_consistency(old_root: &Digest, new_root: &Digest, proof: &ConsistencyProof) -> bool {
    let (old_size, new_size) = (proof.old_size, proof.new_size);

    if old_size > new_size {
        debug!(
            "Consistency rejected: old size {} > new size {}",
            old_size, new_size
        );
        return false;
    }
    if old_size == 0 {
        return proof.path.is_empty() && *old_root == empty_root();
    }
    if old_size == new_size {
        return proof.path.is_empty() && old_root == new_root;
    }

    let expected_len = consistency_path_len(old_size, new_size);
    if proof.path.len() != expected_len {
        debug!(
            "Consistency rejected: {} hashes, expected {}",
            proof.path.len(),
            expected_len
        );
        return false;
    }

    // A power-of-two old tree is itself a node of the new one and is not sent
    let mut path = Vec::with_capacity(expected_len + 1);
    if old_size.is_power_of_two() {
        path.push(*old_root);
    }
    path.extend_from_slice(&proof.path);

    let mut index = old_size - 1;
    let mut last = new_size - 1;
    while index & 1 == 1 {
        index >>= 1;
        last >>= 1;
    }

    let (first, rest) = match path.split_first() {
        Some(split) => split,
        None => return false,
    };
    let mut old_acc = *first;
    let mut new_acc = *first;
    for hash in rest {
        if last == 0 {
            debug!("Consistency rejected: proof longer than the tree height");
            return false;
        }
        if index & 1 == 1 || index == last {
            old_acc = node_hash(hash, &old_acc);
            new_acc = node_hash(hash, &new_acc);
            if index & 1 == 0 {
                while index & 1 == 0 && index != 0 {
                    index >>= 1;
                    last >>= 1;
                }
            }
        } else {
            new_acc = node_hash(&new_acc, hash);
        }
        index >>= 1;
        last >>= 1;
    }

    let valid = last == 0 && old_acc == *old_root && new_acc == *new_root;
    if !valid {
        debug!(
            "Consistency rejected for {} -> {}: recomputed roots do not match",
            old_size, new_size
        );
    }
    valid
}
