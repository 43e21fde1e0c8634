// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use roost_tracker::test_support::{StubResponse, StubServer};
use crate::test_support::test_config;
use serial_test::serial;

fn port_of(url: &str) -> u16 {
    url.rsplit(':').next().unwrap().parse().unwrap()
}

#[tokio::test]
async fn wait_for_coop_succeeds_when_healthy() {
    let server = StubServer::start(vec![StubResponse::json(200, "ok")]).await;
    let coop = CoopClient::new(1, port_of(&server.url)).unwrap();
    assert!(wait_for_coop(&coop).await);
}

#[tokio::test]
#[serial]
async fn register_posts_session_payload() {
    // Health answers on the coop stub, registration lands on the
    // registry stub.
    let coop_stub = StubServer::start(vec![StubResponse::json(200, "ok")]).await;
    let registry_stub = StubServer::start(vec![StubResponse::json(201, "{}")]).await;

    let dir = tempfile::tempdir().unwrap();
    let mut cfg = test_config(dir.path());
    cfg.registry_url = registry_stub.url.clone();
    cfg.registry_token = "reg-tok".to_string();
    let coop = CoopClient::new(1, port_of(&coop_stub.url)).unwrap();

    register(&cfg, &coop, None).await;

    let requests = registry_stub.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path, "/api/v1/sessions");
    let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(body["session_id"], serde_json::json!("boot-1"));
    assert_eq!(body["url"], serde_json::json!("http://10.0.0.9:7777"));
    assert_eq!(body["metadata"]["role"], serde_json::json!("worker"));
    assert_eq!(body["metadata"]["pod"], serde_json::json!("pod-0"));
}

#[tokio::test]
#[serial]
async fn register_writes_coop_url_to_agent_notes() {
    let coop_stub = StubServer::start(vec![StubResponse::json(200, "ok")]).await;
    let agent_bead = r#"{
        "id": "bd-3", "type": "agent", "title": "ada", "status": "open",
        "notes": "spawned for demo"
    }"#;
    let tracker_stub = StubServer::start(vec![
        StubResponse::json(200, agent_bead),
        StubResponse::json(200, "{}"),
    ])
    .await;

    let dir = tempfile::tempdir().unwrap();
    let cfg = test_config(dir.path());
    let coop = CoopClient::new(1, port_of(&coop_stub.url)).unwrap();
    let tracker = roost_tracker::TrackerClient::new(&tracker_stub.url, "t").unwrap();

    register(&cfg, &coop, Some(&tracker)).await;

    let requests = tracker_stub.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].method, "PATCH");
    assert_eq!(requests[1].path, "/api/v1/beads/bd-3");
    let body: serde_json::Value = serde_json::from_str(&requests[1].body).unwrap();
    let notes = body["notes"].as_str().unwrap();
    assert!(notes.contains("spawned for demo"));
    assert!(notes.contains("coop_url: http://10.0.0.9:7777"));
}

#[tokio::test]
async fn deregister_without_registry_is_a_noop() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = test_config(dir.path());
    deregister(&cfg).await;
}

#[tokio::test]
async fn deregister_deletes_session() {
    let server = StubServer::start(vec![StubResponse::json(204, "")]).await;
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = test_config(dir.path());
    cfg.registry_url = server.url.clone();

    deregister(&cfg).await;

    let requests = server.requests();
    assert_eq!(requests[0].method, "DELETE");
    assert_eq!(requests[0].path, "/api/v1/sessions/boot-1");
}
