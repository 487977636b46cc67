//! Event Log Service
//!
//! Owns one [`MerkleTree`] per log and serializes access to it: appends take
//! the write lock one at a time, queries share the read lock, so a proof is
//! always computed against a single fully-applied tree state.

pub mod loader;

use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::Result;
use crate::merkle::hasher::{self, Digest};
use crate::merkle::{ConsistencyProof, InclusionProof, InternalNode, MerkleTree, TreeHead};

pub use loader::load_events_from_file;

/// Append/query front of a single log
#[derive(Clone)]
pub struct LogService {
    tree: Arc<RwLock<MerkleTree>>,
}

impl LogService {
    /// Seed a log with an ordered set of events.
    ///
    /// Fails with `HashEngineUnavailable` if the hash primitive does not pass
    /// its self test.
    pub fn new<I, E>(events: I) -> Result<Self>
    where
        I: IntoIterator<Item = E>,
        E: Into<Vec<u8>>,
    {
        hasher::self_test()?;
        let tree = MerkleTree::build(events);
        info!(
            "Log service ready with {} events, root {}",
            tree.size(),
            tree.root_hash()
        );
        Ok(Self {
            tree: Arc::new(RwLock::new(tree)),
        })
    }

    pub fn empty() -> Result<Self> {
        Self::new(Vec::<Vec<u8>>::new())
    }

    /// Seed a log from a file holding one event per line
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let events = load_events_from_file(path)?;
        Self::new(events)
    }

    /// Append one event; returns the head that now includes it
    pub async fn append(&self, event: impl Into<Vec<u8>>) -> Result<TreeHead> {
        let mut tree = self.tree.write().await;
        tree.append(event)?;
        let head = tree.head();
        debug!("Log head advanced to size {}", head.size);
        Ok(head)
    }

    pub async fn head(&self) -> TreeHead {
        self.tree.read().await.head()
    }

    pub async fn root_hash(&self) -> Digest {
        self.tree.read().await.root_hash()
    }

    pub async fn size(&self) -> u64 {
        self.tree.read().await.size()
    }

    pub async fn historical_root(&self, size: u64) -> Result<TreeHead> {
        let root_hash = self.tree.read().await.historical_root_hash(size)?;
        Ok(TreeHead { size, root_hash })
    }

    pub async fn inclusion_proof(&self, leaf_index: u64, tree_size: u64) -> Result<InclusionProof> {
        self.tree.read().await.inclusion_proof(leaf_index, tree_size)
    }

    pub async fn inclusion_proof_for_event(
        &self,
        event: &[u8],
        tree_size: u64,
    ) -> Result<InclusionProof> {
        self.tree
            .read()
            .await
            .inclusion_proof_for_event(event, tree_size)
    }

    pub async fn consistency_proof(&self, old_size: u64, new_size: u64) -> Result<ConsistencyProof> {
        self.tree.read().await.consistency_proof(old_size, new_size)
    }

    /// Internal nodes a persistence layer has to keep
    pub async fn live_nodes(&self) -> Vec<InternalNode> {
        self.tree.read().await.live_nodes().copied().collect()
    }
}
