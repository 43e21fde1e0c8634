// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use roost_tracker::test_support::{StubResponse, StubServer};

const DECISION_OWING_PLAN: &str = r#"{
    "id": "bd-12", "type": "decision", "title": "Ship it?", "status": "closed",
    "fields": {
        "requesting_agent_bead_id": "bd-3",
        "required_artifact": "plan",
        "artifact_status": "pending"
    }
}"#;

const REPORT_BEAD: &str =
    r#"{"id": "bd-40", "type": "report", "title": "plan for bd-12", "status": "open"}"#;

const AGENT_BEAD: &str = r#"{"id": "bd-3", "type": "agent", "title": "ada", "status": "open"}"#;

fn tracker_args(url: &str) -> TrackerArgs {
    TrackerArgs { tracker_url: url.to_string(), tracker_token: "t".to_string() }
}

#[tokio::test]
async fn report_delivers_artifact_and_satisfies_gate() {
    let server = StubServer::start(vec![
        StubResponse::json(200, DECISION_OWING_PLAN),
        // create report, close report
        StubResponse::json(201, REPORT_BEAD),
        StubResponse::json(200, "{}"),
        // stamp decision delivered (read + patch)
        StubResponse::json(200, DECISION_OWING_PLAN),
        StubResponse::json(200, DECISION_OWING_PLAN),
        // satisfy gate (read agent + patch + post)
        StubResponse::json(200, AGENT_BEAD),
        StubResponse::json(200, AGENT_BEAD),
        StubResponse::json(200, "{}"),
    ])
    .await;

    report(
        "bd-12".to_string(),
        "plan".to_string(),
        Some("1. write code\n2. test it".to_string()),
        None,
        tracker_args(&server.url),
    )
    .await
    .unwrap();

    let requests = server.requests();

    // Report created with content, linked parent-child to the decision.
    let create = requests.iter().find(|r| r.path == "/api/v1/beads" && r.method == "POST").unwrap();
    let body: serde_json::Value = serde_json::from_str(&create.body).unwrap();
    assert_eq!(body["type"], serde_json::json!("report"));
    assert_eq!(body["parent"], serde_json::json!("bd-12"));
    assert!(body["fields"]["content"].as_str().unwrap().contains("write code"));

    // Report closed immediately after creation.
    assert!(requests.iter().any(|r| r.path == "/api/v1/beads/bd-40/close"));

    // Decision stamped delivered.
    let stamp = requests
        .iter()
        .find(|r| r.method == "PATCH" && r.path == "/api/v1/beads/bd-12")
        .unwrap();
    let body: serde_json::Value = serde_json::from_str(&stamp.body).unwrap();
    assert_eq!(body["fields"]["artifact_status"], serde_json::json!("delivered"));

    // Gate released for the requesting agent, tagged as the yield path.
    let tag = requests
        .iter()
        .find(|r| r.method == "PATCH" && r.path == "/api/v1/beads/bd-3")
        .unwrap();
    let body: serde_json::Value = serde_json::from_str(&tag.body).unwrap();
    assert_eq!(body["fields"]["gate_satisfied_by"], serde_json::json!("yield"));
    assert_eq!(
        requests.last().unwrap().path,
        "/api/v1/agents/bd-3/gates/decision/satisfy"
    );
}

#[tokio::test]
async fn mismatched_artifact_type_is_rejected() {
    let server = StubServer::start(vec![StubResponse::json(200, DECISION_OWING_PLAN)]).await;

    let err = report(
        "bd-12".to_string(),
        "report".to_string(),
        Some("text".to_string()),
        None,
        tracker_args(&server.url),
    )
    .await
    .unwrap_err();

    let exit = err.downcast::<ExitError>().unwrap();
    assert_eq!(exit.code, 1);
    assert!(exit.message.contains("requires a plan artifact"));
    // Only the initial read happened.
    assert_eq!(server.requests().len(), 1);
}

#[tokio::test]
async fn unknown_artifact_type_is_rejected_without_requests() {
    let server = StubServer::start(vec![]).await;

    let err = report(
        "bd-12".to_string(),
        "novel".to_string(),
        Some("text".to_string()),
        None,
        tracker_args(&server.url),
    )
    .await
    .unwrap_err();

    let exit = err.downcast::<ExitError>().unwrap();
    assert_eq!(exit.code, 1);
    assert!(server.requests().is_empty());
}
