//! Proof Generation
//!
//! Inclusion (audit) paths and consistency proofs, generated top-down from the
//! tree size with the same largest-power-of-two split the tree uses for its
//! roots. No parent pointers are needed: the path for `(index, size)` or
//! `(old, new)` is fully determined by the numbers, and the hashes come from
//! read-only [`SubtreeHashes`] lookups.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LogError, Result};
use crate::merkle::hasher::{node_hash, Digest};
use crate::merkle::tree::{split_point, MerkleTree, NodeId};

/// Read-only view of the hashes a proof generator needs
pub trait SubtreeHashes {
    /// Number of leaves available
    fn size(&self) -> u64;

    /// Hash of a complete subtree, `None` if it does not exist (yet)
    fn perfect_hash(&self, id: NodeId) -> Option<Digest>;

    /// Merkle tree hash of leaves `[start, end)`.
    ///
    /// `start` must sit on a split boundary of the enclosing tree, which holds
    /// for every range the split rule produces.
    fn range_hash(&self, start: u64, end: u64) -> Result<Digest> {
        if start >= end || end > self.size() {
            return Err(LogError::OutOfRange(format!(
                "leaf range [{}, {}) in a tree of size {}",
                start,
                end,
                self.size()
            )));
        }

        let mut peaks = Vec::new();
        let mut position = start;
        while position < end {
            let remaining = end - position;
            let width = 1u64 << (63 - remaining.leading_zeros());
            let id = NodeId::for_range(position, width).ok_or_else(|| {
                LogError::InvalidRange(format!(
                    "leaf range [{}, {}) is not aligned to the split rule",
                    start, end
                ))
            })?;
            let hash = self.perfect_hash(id).ok_or_else(|| {
                LogError::CorruptedState(format!("missing subtree {:?}", id))
            })?;
            peaks.push(hash);
            position += width;
        }

        // Fold right to left: MTH(D[a:b]) = node(MTH(D[a:a+k]), MTH(D[a+k:b]))
        let mut acc = peaks.pop().ok_or_else(|| {
            LogError::CorruptedState(format!("no subtrees for [{}, {})", start, end))
        })?;
        while let Some(left) = peaks.pop() {
            acc = node_hash(&left, &acc);
        }
        Ok(acc)
    }
}

/// Sibling hashes from a leaf up to the root of a tree of `tree_size` leaves
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionProof {
    pub leaf_index: u64,
    pub tree_size: u64,
    pub path: Vec<Digest>,
}

impl InclusionProof {
    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }
}

/// Hashes proving the tree at `new_size` extends the tree at `old_size`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyProof {
    pub old_size: u64,
    pub new_size: u64,
    pub path: Vec<Digest>,
}

impl ConsistencyProof {
    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }
}

/// Number of hashes in the inclusion path of `leaf_index` within `tree_size`
pub fn inclusion_path_len(leaf_index: u64, tree_size: u64) -> usize {
    let (mut start, mut end) = (0u64, tree_size);
    let mut len = 0;
    while end - start > 1 {
        let mid = start + split_point(end - start);
        if leaf_index < mid {
            end = mid;
        } else {
            start = mid;
        }
        len += 1;
    }
    len
}

/// Number of hashes in the consistency proof from `old_size` to `new_size`
pub fn consistency_path_len(old_size: u64, new_size: u64) -> usize {
    if old_size == 0 || old_size >= new_size {
        return 0;
    }
    let (mut start, mut end) = (0u64, new_size);
    let mut complete = true;
    let mut len = 0;
    while old_size != end {
        let mid = start + split_point(end - start);
        if old_size <= mid {
            end = mid;
        } else {
            start = mid;
            complete = false;
        }
        len += 1;
    }
    if complete {
        len
    } else {
        len + 1
    }
}

/// Computes proofs against any [`SubtreeHashes`] source
pub struct ProofGenerator<'a, T: SubtreeHashes + ?Sized> {
    source: &'a T,
}

impl<'a, T: SubtreeHashes + ?Sized> ProofGenerator<'a, T> {
    pub fn new(source: &'a T) -> Self {
        Self { source }
    }

    /// Audit path for `leaf_index` in the tree of `tree_size` leaves.
    ///
    /// The path is ordered from the leaf's sibling up to the root's child.
    pub fn inclusion_proof(&self, leaf_index: u64, tree_size: u64) -> Result<InclusionProof> {
        if tree_size > self.source.size() {
            return Err(LogError::size_out_of_range(tree_size, self.source.size()));
        }
        if leaf_index >= tree_size {
            return Err(LogError::leaf_out_of_range(leaf_index, tree_size));
        }

        let mut path = Vec::with_capacity(inclusion_path_len(leaf_index, tree_size));
        let (mut start, mut end) = (0u64, tree_size);
        while end - start > 1 {
            let mid = start + split_point(end - start);
            if leaf_index < mid {
                path.push(self.source.range_hash(mid, end)?);
                end = mid;
            } else {
                path.push(self.source.range_hash(start, mid)?);
                start = mid;
            }
        }
        path.reverse();

        debug!(
            "Generated inclusion proof for leaf {} in size {} ({} hashes)",
            leaf_index,
            tree_size,
            path.len()
        );
        Ok(InclusionProof {
            leaf_index,
            tree_size,
            path,
        })
    }

    /// Consistency proof between two sizes.
    ///
    /// Walks down the new tree along the boundary of the old one. Every
    /// subtree hanging off the boundary goes into the proof; the subtree the
    /// walk ends on is included too unless it is the whole old tree.
    pub fn consistency_proof(&self, old_size: u64, new_size: u64) -> Result<ConsistencyProof> {
        if old_size > new_size {
            return Err(LogError::reversed_range(old_size, new_size));
        }
        if new_size > self.source.size() {
            return Err(LogError::size_out_of_range(new_size, self.source.size()));
        }
        if old_size == 0 || old_size == new_size {
            return Ok(ConsistencyProof {
                old_size,
                new_size,
                path: Vec::new(),
            });
        }

        let mut path = Vec::with_capacity(consistency_path_len(old_size, new_size));
        let (mut start, mut end) = (0u64, new_size);
        let mut complete = true;
        while old_size != end {
            let mid = start + split_point(end - start);
            if old_size <= mid {
                path.push(self.source.range_hash(mid, end)?);
                end = mid;
            } else {
                path.push(self.source.range_hash(start, mid)?);
                start = mid;
                complete = false;
            }
        }
        if !complete {
            path.push(self.source.range_hash(start, end)?);
        }
        path.reverse();

        debug!(
            "Generated consistency proof {} -> {} ({} hashes)",
            old_size,
            new_size,
            path.len()
        );
        Ok(ConsistencyProof {
            old_size,
            new_size,
            path,
        })
    }
}

impl MerkleTree {
    pub fn inclusion_proof(&self, leaf_index: u64, tree_size: u64) -> Result<InclusionProof> {
        ProofGenerator::new(self).inclusion_proof(leaf_index, tree_size)
    }

    pub fn consistency_proof(&self, old_size: u64, new_size: u64) -> Result<ConsistencyProof> {
        ProofGenerator::new(self).consistency_proof(old_size, new_size)
    }

    /// Inclusion proof for the first leaf holding `event`, within `tree_size`
    pub fn inclusion_proof_for_event(&self, event: &[u8], tree_size: u64) -> Result<InclusionProof> {
        let index = self.find_leaf(event)?;
        if index >= tree_size {
            return Err(LogError::NotFound(format!(
                "event first appears at index {}, beyond tree size {}",
                index, tree_size
            )));
        }
        self.inclusion_proof(index, tree_size)
    }
}
