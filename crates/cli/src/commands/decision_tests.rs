// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use roost_tracker::test_support::{StubResponse, StubServer};

#[test]
fn plain_option_has_no_artifact() {
    let option = parse_option("ok=Looks good").unwrap();
    assert_eq!(option.id, "ok");
    assert_eq!(option.label, "Looks good");
    assert_eq!(option.artifact(), None);
}

#[test]
fn artifact_suffix_is_parsed() {
    let option = parse_option("p=Write it up:plan").unwrap();
    assert_eq!(option.label, "Write it up");
    assert_eq!(option.artifact(), Some(ArtifactType::Plan));

    let option = parse_option("d=Summarize:diff-summary").unwrap();
    assert_eq!(option.artifact(), Some(ArtifactType::DiffSummary));
}

#[test]
fn colon_in_label_stays_in_label() {
    let option = parse_option("x=Note: check the logs").unwrap();
    assert_eq!(option.label, "Note: check the logs");
    assert_eq!(option.artifact(), None);
}

#[yare::parameterized(
    no_equals   = { "just-text" },
    empty_id    = { "=label" },
    empty_label = { "id=" },
)]
fn malformed_specs_are_rejected(spec: &str) {
    assert!(parse_option(spec).is_err());
}

#[tokio::test]
async fn create_posts_decision_with_options() {
    let created = r#"{"id": "bd-12", "type": "decision", "title": "Ship it?", "status": "open"}"#;
    let server = StubServer::start(vec![StubResponse::json(201, created)]).await;

    create(
        "Ship it?".to_string(),
        vec!["ok=Ship".to_string(), "p=Plan first:plan".to_string()],
        Some("bd-3".to_string()),
        TrackerArgs { tracker_url: server.url.clone(), tracker_token: "t".to_string() },
    )
    .await
    .unwrap();

    let requests = server.requests();
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path, "/api/v1/beads");
    let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(body["type"], serde_json::json!("decision"));
    assert_eq!(body["title"], serde_json::json!("Ship it?"));
    assert_eq!(
        body["fields"]["requesting_agent_bead_id"],
        serde_json::json!("bd-3")
    );
    let options: Vec<DecisionOption> =
        serde_json::from_value(body["fields"]["options"].clone()).unwrap();
    assert_eq!(options.len(), 2);
    assert_eq!(options[1].artifact(), Some(ArtifactType::Plan));
}

#[tokio::test]
async fn invalid_option_spec_fails_before_any_request() {
    let server = StubServer::start(vec![]).await;

    let err = create(
        "q".to_string(),
        vec!["broken".to_string()],
        Some("bd-3".to_string()),
        TrackerArgs { tracker_url: server.url.clone(), tracker_token: "t".to_string() },
    )
    .await
    .unwrap_err();

    let exit = err.downcast::<crate::exit_error::ExitError>().unwrap();
    assert_eq!(exit.code, 1);
    assert!(server.requests().is_empty());
}
