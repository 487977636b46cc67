use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tower::ServiceExt;

use merkle_log::api::{router, ErrorBody};
use merkle_log::merkle::proof::{ConsistencyProof, InclusionProof};
use merkle_log::merkle::{verify_consistency, verify_inclusion, InternalNode};
use merkle_log::TreeHead;

mod common;
use common::*;

fn test_router(events: &[String]) -> Router {
    router(create_test_config(), create_test_service(events))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

async fn get_json<T: DeserializeOwned>(app: &Router, uri: &str) -> (StatusCode, T) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

async fn post_event(app: &Router, event: &str) -> (StatusCode, TreeHead) {
    let request = Request::builder()
        .method("POST")
        .uri("/events")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "event": event }).to_string()))
        .unwrap();
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_health_check() {
    let app = test_router(&scenario_events());
    let (status, body): (_, Value) = get_json(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["server_id"], "test-log");
    assert_eq!(body["size"], 4);
}

#[tokio::test]
async fn test_head_matches_local_tree() {
    let events = scenario_events();
    let app = test_router(&events);
    let (status, head): (_, TreeHead) = get_json(&app, "/tree/head").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(head, build_tree(&events).head());
}

#[tokio::test]
async fn test_digest_is_hex_on_the_wire() {
    let app = test_router(&scenario_events());
    let (_, body): (_, Value) = get_json(&app, "/tree/head").await;

    let root = body["root_hash"].as_str().unwrap();
    assert_eq!(root.len(), 64);
    assert!(root.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
}

#[tokio::test]
async fn test_append_then_prove() {
    let app = test_router(&scenario_events()[..3]);
    let (_, before): (_, TreeHead) = get_json(&app, "/tree/head").await;

    let (status, after) = post_event(&app, "Event4").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(after.size, 4);

    let (status, old): (_, TreeHead) = get_json(&app, "/tree/root/3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(old, before);

    let (status, proof): (_, InclusionProof) =
        get_json(&app, "/proof/inclusion?index=3&size=4").await;
    assert_eq!(status, StatusCode::OK);
    assert!(verify_inclusion(b"Event4", 3, &proof, &after.root_hash));

    let (status, proof): (_, ConsistencyProof) =
        get_json(&app, "/proof/consistency?old=3&new=4").await;
    assert_eq!(status, StatusCode::OK);
    assert!(verify_consistency(&before.root_hash, &after.root_hash, &proof));
}

#[tokio::test]
async fn test_proofs_default_to_current_size() {
    let app = test_router(&numbered_events(5));
    let (_, head): (_, TreeHead) = get_json(&app, "/tree/head").await;

    let (_, proof): (_, InclusionProof) = get_json(&app, "/proof/inclusion?index=1").await;
    assert_eq!(proof.tree_size, 5);
    assert!(verify_inclusion(b"event-1", 1, &proof, &head.root_hash));

    let (_, proof): (_, ConsistencyProof) = get_json(&app, "/proof/consistency?old=2").await;
    assert_eq!(proof.new_size, 5);
}

#[tokio::test]
async fn test_event_proof() {
    let app = test_router(&scenario_events());
    let (_, head): (_, TreeHead) = get_json(&app, "/tree/head").await;

    let (status, proof): (_, InclusionProof) = get_json(&app, "/proof/event?event=Event3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(proof.leaf_index, 2);
    assert!(verify_inclusion(b"Event3", 2, &proof, &head.root_hash));
}

#[tokio::test]
async fn test_unknown_event_is_not_found() {
    let app = test_router(&scenario_events());
    let (status, body): (_, ErrorBody) = get_json(&app, "/proof/event?event=Event9").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body.error, "not_found");
}

#[tokio::test]
async fn test_out_of_range_inclusion() {
    let app = test_router(&scenario_events()[..3]);
    let (status, body): (_, ErrorBody) = get_json(&app, "/proof/inclusion?index=10&size=3").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.error, "out_of_range");
}

#[tokio::test]
async fn test_reversed_consistency_range() {
    let app = test_router(&numbered_events(6));
    let (status, body): (_, ErrorBody) = get_json(&app, "/proof/consistency?old=5&new=3").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.error, "invalid_range");
}

#[tokio::test]
async fn test_historical_root_beyond_size() {
    let app = test_router(&scenario_events());
    let (status, body): (_, ErrorBody) = get_json(&app, "/tree/root/5").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.error, "out_of_range");
}

#[tokio::test]
async fn test_live_nodes() {
    let app = test_router(&numbered_events(6));
    let (status, nodes): (_, Vec<InternalNode>) = get_json(&app, "/tree/nodes").await;

    assert_eq!(status, StatusCode::OK);
    // [0,2) [2,4) [4,6) [0,4)
    assert_eq!(nodes.len(), 4);
    assert!(nodes.iter().all(|node| node.end() <= 6));
}

#[tokio::test]
async fn test_failed_request_leaves_log_untouched() {
    let app = test_router(&scenario_events());
    let (_, before): (_, TreeHead) = get_json(&app, "/tree/head").await;

    let (status, _): (_, ErrorBody) = get_json(&app, "/proof/consistency?old=9&new=2").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, after): (_, TreeHead) = get_json(&app, "/tree/head").await;
    assert_eq!(before, after);
}
