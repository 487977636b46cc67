//! Append-only Merkle Tree
//!
//! Leaves and complete ("perfect") internal subtrees are kept in an arena
//! addressed by [`NodeId`]: `(level, index)` covers leaves
//! `[index * 2^level, (index + 1) * 2^level)`. Parent and child relations are
//! computed from the id, never stored. A perfect subtree never changes once
//! its last leaf has been appended, so every historical tree size can be
//! answered from the arena. The right edge of a non-power-of-two tree is
//! never stored; it is folded from the perfect subtrees on demand.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::error::{LogError, Result};
use crate::merkle::hasher::{empty_root, leaf_hash, node_hash, Digest};
use crate::merkle::proof::SubtreeHashes;

/// Largest power of two strictly less than `n` (`n > 1`)
pub fn split_point(n: u64) -> u64 {
    debug_assert!(n > 1);
    1u64 << (63 - (n - 1).leading_zeros())
}

/// Address of a perfect subtree in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId {
    pub level: u32,
    pub index: u64,
}

impl NodeId {
    pub fn new(level: u32, index: u64) -> Self {
        Self { level, index }
    }

    /// Number of leaves covered
    pub fn width(&self) -> u64 {
        1u64 << self.level
    }

    /// First covered leaf index
    pub fn start(&self) -> u64 {
        self.index << self.level
    }

    /// Last covered leaf index (inclusive)
    pub fn end(&self) -> u64 {
        self.start() + self.width() - 1
    }

    pub fn is_leaf(&self) -> bool {
        self.level == 0
    }

    pub fn parent(&self) -> NodeId {
        NodeId::new(self.level + 1, self.index >> 1)
    }

    pub fn children(&self) -> Option<(NodeId, NodeId)> {
        if self.is_leaf() {
            return None;
        }
        let level = self.level - 1;
        Some((
            NodeId::new(level, self.index << 1),
            NodeId::new(level, (self.index << 1) + 1),
        ))
    }

    /// The perfect subtree covering `[start, start + width)`, if that range is aligned
    pub fn for_range(start: u64, width: u64) -> Option<NodeId> {
        if width == 0 || !width.is_power_of_two() || start % width != 0 {
            return None;
        }
        let level = width.trailing_zeros();
        Some(NodeId::new(level, start >> level))
    }
}

/// One logged event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    pub index: u64,
    pub event: Vec<u8>,
    pub hash: Digest,
}

impl Leaf {
    fn new(index: u64, event: Vec<u8>) -> Self {
        let hash = leaf_hash(&event);
        Self { index, event, hash }
    }
}

/// A complete internal subtree. Its children are `id.children()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalNode {
    pub id: NodeId,
    pub hash: Digest,
}

impl InternalNode {
    pub fn start(&self) -> u64 {
        self.id.start()
    }

    pub fn end(&self) -> u64 {
        self.id.end()
    }
}

/// Tree size together with the root committing to it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeHead {
    pub size: u64,
    pub root_hash: Digest,
}

impl TreeHead {
    pub fn empty() -> Self {
        Self {
            size: 0,
            root_hash: empty_root(),
        }
    }
}

/// Append-only Merkle tree over opaque event payloads
#[derive(Debug, Clone, Default)]
pub struct MerkleTree {
    leaves: Vec<Leaf>,
    /// `internal[h - 1][i]` is the perfect subtree `NodeId { level: h, index: i }`
    internal: Vec<Vec<InternalNode>>,
    positions: HashMap<Digest, u64>,
    root: Option<Digest>,
}

impl MerkleTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from an ordered sequence of events, bottom-up
    pub fn build<I, E>(events: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Vec<u8>>,
    {
        let mut tree = Self::new();
        for (index, event) in events.into_iter().enumerate() {
            tree.push_leaf(Leaf::new(index as u64, event.into()));
        }

        let mut level = 0u32;
        loop {
            let below = tree.level_len(level);
            if below < 2 {
                break;
            }
            let nodes: Vec<InternalNode> = (0..below / 2)
                .filter_map(|index| tree.combine(NodeId::new(level + 1, index)))
                .collect();
            tree.internal.push(nodes);
            level += 1;
        }

        tree.root = tree.range_hash(0, tree.size()).ok();
        info!(
            "Built Merkle tree with {} leaves, root {}",
            tree.size(),
            tree.root_hash()
        );
        tree
    }

    /// Append one event and return the new root hash.
    ///
    /// Only the perfect subtrees completed by this leaf are created; every
    /// existing node is left untouched.
    pub fn append(&mut self, event: impl Into<Vec<u8>>) -> Result<Digest> {
        self.check_structure()?;

        let index = self.size();
        self.push_leaf(Leaf::new(index, event.into()));

        let mut id = NodeId::new(0, index);
        while id.index & 1 == 1 {
            let parent = id.parent();
            let node = self.combine(parent).ok_or_else(|| {
                LogError::CorruptedState(format!("missing children of {:?}", parent))
            })?;
            let slot = (parent.level - 1) as usize;
            if self.internal.len() == slot {
                self.internal.push(Vec::new());
            }
            self.internal[slot].push(node);
            id = parent;
        }

        let root = self.range_hash(0, self.size())?;
        self.root = Some(root);
        debug!("Appended leaf {}, new root {}", index, root);
        Ok(root)
    }

    /// Current root, or the empty-tree sentinel when no event has been appended
    pub fn root_hash(&self) -> Digest {
        self.root.unwrap_or_else(empty_root)
    }

    pub fn size(&self) -> u64 {
        self.leaves.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn head(&self) -> TreeHead {
        TreeHead {
            size: self.size(),
            root_hash: self.root_hash(),
        }
    }

    /// Root of the tree as it was when it held exactly `size` leaves
    pub fn historical_root_hash(&self, size: u64) -> Result<Digest> {
        if size > self.size() {
            return Err(LogError::size_out_of_range(size, self.size()));
        }
        if size == 0 {
            return Ok(empty_root());
        }
        if size == self.size() {
            return Ok(self.root_hash());
        }
        self.range_hash(0, size)
    }

    pub fn leaf(&self, index: u64) -> Option<&Leaf> {
        self.leaves.get(usize::try_from(index).ok()?)
    }

    pub fn leaves(&self) -> &[Leaf] {
        &self.leaves
    }

    /// Index of the first leaf holding exactly `event`
    pub fn find_leaf(&self, event: &[u8]) -> Result<u64> {
        self.positions
            .get(&leaf_hash(event))
            .copied()
            .ok_or_else(|| LogError::NotFound(format!("event {:?}", String::from_utf8_lossy(event))))
    }

    /// Stored internal nodes.
    ///
    /// This is exactly the set a persistence layer must retain (together with
    /// the leaves) to answer root and proof queries for every size up to the
    /// current one. Right-edge nodes of non-power-of-two sizes are derived and
    /// never listed.
    pub fn live_nodes(&self) -> impl Iterator<Item = &InternalNode> + '_ {
        self.internal.iter().flatten()
    }

    fn push_leaf(&mut self, leaf: Leaf) {
        self.positions.entry(leaf.hash).or_insert(leaf.index);
        self.leaves.push(leaf);
    }

    fn combine(&self, id: NodeId) -> Option<InternalNode> {
        let (left, right) = id.children()?;
        let hash = node_hash(&self.perfect_hash(left)?, &self.perfect_hash(right)?);
        Some(InternalNode { id, hash })
    }

    fn level_len(&self, level: u32) -> u64 {
        if level == 0 {
            self.size()
        } else {
            self.internal
                .get((level - 1) as usize)
                .map_or(0, |nodes| nodes.len() as u64)
        }
    }

    /// Every level must hold exactly `size >> level` perfect subtrees
    fn check_structure(&self) -> Result<()> {
        let size = self.size();
        if let Some(last) = self.leaves.last() {
            if last.index + 1 != size {
                return Err(LogError::CorruptedState(format!(
                    "last leaf carries index {} in a tree of size {}",
                    last.index, size
                )));
            }
        }
        for (slot, nodes) in self.internal.iter().enumerate() {
            let level = slot as u32 + 1;
            let expected = size >> level;
            if nodes.len() as u64 != expected {
                return Err(LogError::CorruptedState(format!(
                    "level {} holds {} nodes, expected {}",
                    level,
                    nodes.len(),
                    expected
                )));
            }
        }
        if size >> (self.internal.len() + 1) != 0 {
            return Err(LogError::CorruptedState(format!(
                "only {} internal levels for {} leaves",
                self.internal.len(),
                size
            )));
        }
        Ok(())
    }
}

impl SubtreeHashes for MerkleTree {
    fn size(&self) -> u64 {
        MerkleTree::size(self)
    }

    fn perfect_hash(&self, id: NodeId) -> Option<Digest> {
        let index = usize::try_from(id.index).ok()?;
        if id.is_leaf() {
            self.leaves.get(index).map(|leaf| leaf.hash)
        } else {
            self.internal
                .get((id.level - 1) as usize)?
                .get(index)
                .map(|node| node.hash)
        }
    }
}
