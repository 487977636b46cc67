pub mod api;
pub mod auditor;
pub mod config;
pub mod error;
pub mod log;
pub mod merkle;

pub use error::{LogError, Result};
pub use log::LogService;
pub use merkle::{Digest, MerkleTree, TreeHead};
