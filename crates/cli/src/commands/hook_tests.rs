// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use roost_tracker::test_support::{StubResponse, StubServer};

fn tracker_args(url: &str) -> TrackerArgs {
    TrackerArgs { tracker_url: url.to_string(), tracker_token: "t".to_string() }
}

#[yare::parameterized(
    stop_in_chain      = { "Stop", true, true },
    stop_fresh         = { "Stop", false, false },
    pretooluse_in_chain = { "PreToolUse", true, false },
)]
fn immediate_exit_guard(event: &str, stop_hook_active: bool, expected: bool) {
    let input = HookInput { stop_hook_active };
    assert_eq!(allows_immediate_exit(event, &input), expected);
}

#[test]
fn hook_input_defaults_on_garbage() {
    let input: HookInput = serde_json::from_str("{}").unwrap();
    assert!(!input.stop_hook_active);
    let input: Result<HookInput, _> = serde_json::from_str("not json");
    assert!(input.is_err());
}

#[test]
fn block_verdict_is_exit_two_with_payload() {
    let verdict = roost_tracker::HookVerdict {
        block: true,
        reason: "decision gate pending".to_string(),
        warnings: vec![],
    };
    let err = verdict_to_result(&verdict).unwrap_err();
    let exit = err.downcast::<ExitError>().unwrap();
    assert_eq!(exit.code, 2);

    let payload: serde_json::Value = serde_json::from_str(&exit.message).unwrap();
    assert_eq!(payload["decision"], serde_json::json!("block"));
    assert_eq!(payload["reason"], serde_json::json!("decision gate pending"));
}

#[test]
fn allow_verdict_is_ok_even_with_warnings() {
    let verdict = roost_tracker::HookVerdict {
        block: false,
        reason: String::new(),
        warnings: vec!["stale assignment".to_string()],
    };
    assert!(verdict_to_result(&verdict).is_ok());
}

#[tokio::test]
async fn emit_sends_event_and_allows() {
    let server = StubServer::start(vec![StubResponse::json(200, r#"{"block": false}"#)]).await;

    emit("PreToolUse".to_string(), Some("bd-3".to_string()), tracker_args(&server.url))
        .await
        .unwrap();

    let requests = server.requests();
    assert_eq!(requests[0].path, "/api/v1/hooks/emit");
    let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(body["event"], serde_json::json!("PreToolUse"));
    assert_eq!(body["agent_bead_id"], serde_json::json!("bd-3"));
}

#[tokio::test]
async fn emit_translates_block_to_exit_two() {
    let server = StubServer::start(vec![StubResponse::json(
        200,
        r#"{"block": true, "reason": "yield first"}"#,
    )])
    .await;

    let err = emit("Stop".to_string(), Some("bd-3".to_string()), tracker_args(&server.url))
        .await
        .unwrap_err();
    let exit = err.downcast::<ExitError>().unwrap();
    assert_eq!(exit.code, 2);
    assert!(exit.message.contains("yield first"));
}

#[tokio::test]
async fn emit_client_error_is_exit_one() {
    let server = StubServer::start(vec![StubResponse::json(400, "bad request")]).await;

    let err = emit("Stop".to_string(), Some("bd-3".to_string()), tracker_args(&server.url))
        .await
        .unwrap_err();
    let exit = err.downcast::<ExitError>().unwrap();
    assert_eq!(exit.code, 1);
}
