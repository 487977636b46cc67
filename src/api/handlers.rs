use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api::{ApiError, AppState};
use crate::merkle::{ConsistencyProof, InclusionProof, InternalNode, TreeHead};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendRequest {
    pub event: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InclusionQuery {
    pub index: u64,
    /// Defaults to the current tree size
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventQuery {
    pub event: String,
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsistencyQuery {
    pub old: u64,
    /// Defaults to the current tree size
    pub new: Option<u64>,
}

pub async fn health_check(State((config, service)): State<AppState>) -> Json<Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "merkle-log",
        "server_id": config.server_id,
        "size": service.size().await,
        "timestamp": chrono::Utc::now()
    }))
}

pub async fn tree_head(State((_config, service)): State<AppState>) -> Json<TreeHead> {
    Json(service.head().await)
}

pub async fn historical_root(
    State((_config, service)): State<AppState>,
    Path(size): Path<u64>,
) -> Result<Json<TreeHead>, ApiError> {
    Ok(Json(service.historical_root(size).await?))
}

pub async fn live_nodes(State((_config, service)): State<AppState>) -> Json<Vec<InternalNode>> {
    Json(service.live_nodes().await)
}

pub async fn append_event(
    State((_config, service)): State<AppState>,
    Json(request): Json<AppendRequest>,
) -> Result<(StatusCode, Json<TreeHead>), ApiError> {
    let head = service.append(request.event.into_bytes()).await?;
    info!("Appended event, log size now {}", head.size);
    Ok((StatusCode::CREATED, Json(head)))
}

pub async fn inclusion_proof(
    State((_config, service)): State<AppState>,
    Query(query): Query<InclusionQuery>,
) -> Result<Json<InclusionProof>, ApiError> {
    let size = match query.size {
        Some(size) => size,
        None => service.size().await,
    };
    debug!("Inclusion proof requested for leaf {} in size {}", query.index, size);
    Ok(Json(service.inclusion_proof(query.index, size).await?))
}

pub async fn event_proof(
    State((_config, service)): State<AppState>,
    Query(query): Query<EventQuery>,
) -> Result<Json<InclusionProof>, ApiError> {
    let size = match query.size {
        Some(size) => size,
        None => service.size().await,
    };
    match service
        .inclusion_proof_for_event(query.event.as_bytes(), size)
        .await
    {
        Ok(proof) => Ok(Json(proof)),
        Err(e) => {
            warn!("No inclusion proof for requested event: {}", e);
            Err(e.into())
        }
    }
}

pub async fn consistency_proof(
    State((_config, service)): State<AppState>,
    Query(query): Query<ConsistencyQuery>,
) -> Result<Json<ConsistencyProof>, ApiError> {
    let new = match query.new {
        Some(new) => new,
        None => service.size().await,
    };
    debug!("Consistency proof requested for {} -> {}", query.old, new);
    Ok(Json(service.consistency_proof(query.old, new).await?))
}
