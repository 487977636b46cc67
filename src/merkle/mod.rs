//! Merkle Tree Engine
//!
//! Domain-separated hashing, the append-only tree, proof generation and the
//! stateless verifier used by auditors.

pub mod hasher;
pub mod proof;
pub mod tree;
pub mod verify;

pub use hasher::{empty_root, leaf_hash, node_hash, Digest};
pub use proof::{ConsistencyProof, InclusionProof, ProofGenerator, SubtreeHashes};
pub use tree::{InternalNode, Leaf, MerkleTree, NodeId, TreeHead};
pub use verify::{verify_consistency, verify_inclusion};
