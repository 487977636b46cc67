//! Log Server Client
//!
//! Talks to a remote log over the HTTP transport and decodes its answers
//! into the crate's proof types. Nothing it returns is trusted; callers hand
//! the results to the verifier.

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::api::handlers::AppendRequest;
use crate::api::ErrorBody;
use crate::error::{LogError, Result};
use crate::merkle::{ConsistencyProof, InclusionProof, TreeHead};

/// HTTP client for a remote log server
#[derive(Debug, Clone)]
pub struct LogClient {
    base_url: String,
    http_client: Client,
}

impl LogClient {
    /// Create new client for the server at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            http_client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn head(&self) -> Result<TreeHead> {
        self.get("/tree/head", &[]).await
    }

    pub async fn historical_root(&self, size: u64) -> Result<TreeHead> {
        self.get(&format!("/tree/root/{}", size), &[]).await
    }

    pub async fn append(&self, event: &str) -> Result<TreeHead> {
        let url = format!("{}/events", self.base_url);
        debug!("POST {}", url);
        let response = self
            .http_client
            .post(&url)
            .json(&AppendRequest {
                event: event.to_string(),
            })
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn inclusion_proof(&self, leaf_index: u64, tree_size: u64) -> Result<InclusionProof> {
        self.get(
            "/proof/inclusion",
            &[
                ("index", leaf_index.to_string()),
                ("size", tree_size.to_string()),
            ],
        )
        .await
    }

    pub async fn event_proof(&self, event: &str, tree_size: u64) -> Result<InclusionProof> {
        self.get(
            "/proof/event",
            &[("event", event.to_string()), ("size", tree_size.to_string())],
        )
        .await
    }

    pub async fn consistency_proof(&self, old_size: u64, new_size: u64) -> Result<ConsistencyProof> {
        self.get(
            "/proof/consistency",
            &[("old", old_size.to_string()), ("new", new_size.to_string())],
        )
        .await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {} {:?}", url, query);
        let response = self.http_client.get(&url).query(query).send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| LogError::SerializationError(e.to_string()));
        }

        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ErrorBody>(&body) {
            Ok(error) => Err(error.into_error()),
            Err(_) => Err(LogError::TransportError(format!(
                "server answered {}: {}",
                status, body
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_normalized() {
        let client = LogClient::new("http://localhost:3000/");
        assert_eq!(client.base_url(), "http://localhost:3000");
    }
}
