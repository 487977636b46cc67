//! Remote Auditor
//!
//! Keeps the last tree head it has verified and checks a remote log against
//! it: events must be provably included under the trusted root, and every
//! new head must be a consistent extension of the trusted one before it is
//! adopted.

pub mod client;

use tracing::{info, warn};

use crate::error::{LogError, Result};
use crate::merkle::{verify_consistency, verify_inclusion, TreeHead};

pub use client::LogClient;

pub struct Auditor {
    client: LogClient,
    trusted: Option<TreeHead>,
}

impl Auditor {
    /// Auditor with no trusted head; the first head seen is adopted
    pub fn new(client: LogClient) -> Self {
        Self {
            client,
            trusted: None,
        }
    }

    /// Auditor that already trusts `head`, e.g. one it persisted earlier
    pub fn with_trusted_head(client: LogClient, head: TreeHead) -> Self {
        Self {
            client,
            trusted: Some(head),
        }
    }

    pub fn trusted_head(&self) -> Option<TreeHead> {
        self.trusted
    }

    pub fn client(&self) -> &LogClient {
        &self.client
    }

    async fn trusted_or_current(&mut self) -> Result<TreeHead> {
        match self.trusted {
            Some(head) => Ok(head),
            None => {
                let head = self.client.head().await?;
                info!("Trusting first observed head: size {}", head.size);
                self.trusted = Some(head);
                Ok(head)
            }
        }
    }

    /// Is `event` part of the log committed to by the trusted head?
    ///
    /// An event the server cannot find is a negative answer, not an error.
    pub async fn verify_event_existence(&mut self, event: &str) -> Result<bool> {
        let head = self.trusted_or_current().await?;
        if head.size == 0 {
            return Ok(false);
        }

        let proof = match self.client.event_proof(event, head.size).await {
            Ok(proof) => proof,
            Err(LogError::NotFound(_)) => return Ok(false),
            Err(e) => return Err(e),
        };
        if proof.tree_size != head.size {
            warn!(
                "Server answered with a proof for size {}, asked for {}",
                proof.tree_size, head.size
            );
            return Ok(false);
        }

        Ok(verify_inclusion(
            event.as_bytes(),
            proof.leaf_index,
            &proof,
            &head.root_hash,
        ))
    }

    /// Is `event` at `leaf_index` under the trusted head?
    pub async fn verify_inclusion_at(&mut self, event: &str, leaf_index: u64) -> Result<bool> {
        let head = self.trusted_or_current().await?;
        if leaf_index >= head.size {
            return Ok(false);
        }

        let proof = self.client.inclusion_proof(leaf_index, head.size).await?;
        if proof.tree_size != head.size {
            return Ok(false);
        }
        Ok(verify_inclusion(
            event.as_bytes(),
            leaf_index,
            &proof,
            &head.root_hash,
        ))
    }

    /// Fetch the current head and adopt it if it extends the trusted one.
    ///
    /// Returns false, keeping the old head, when the log shrank or the
    /// consistency proof does not check out.
    pub async fn verify_log_growth(&mut self) -> Result<bool> {
        let current = self.client.head().await?;
        let trusted = match self.trusted {
            Some(trusted) => trusted,
            None => {
                info!("Trusting first observed head: size {}", current.size);
                self.trusted = Some(current);
                return Ok(true);
            }
        };

        if current.size < trusted.size {
            warn!(
                "Log shrank from {} to {} entries",
                trusted.size, current.size
            );
            return Ok(false);
        }

        let proof = self
            .client
            .consistency_proof(trusted.size, current.size)
            .await?;
        if proof.old_size != trusted.size || proof.new_size != current.size {
            warn!(
                "Server answered with a proof for {} -> {}, asked for {} -> {}",
                proof.old_size, proof.new_size, trusted.size, current.size
            );
            return Ok(false);
        }

        if verify_consistency(&trusted.root_hash, &current.root_hash, &proof) {
            info!(
                "Log grew consistently from {} to {} entries",
                trusted.size, current.size
            );
            self.trusted = Some(current);
            Ok(true)
        } else {
            warn!(
                "Consistency check failed between sizes {} and {}",
                trusted.size, current.size
            );
            Ok(false)
        }
    }
}
