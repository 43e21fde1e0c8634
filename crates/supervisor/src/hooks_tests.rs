// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn default_hooks_cover_required_types() {
    let hooks = default_hooks();
    for hook_type in DEFAULT_HOOK_TYPES {
        let entry = hooks.get(hook_type).unwrap_or_else(|| panic!("missing {hook_type}"));
        let command = entry[0]["hooks"][0]["command"].as_str().unwrap();
        assert_eq!(command, format!("roost hook emit {}", hook_type));
    }
}

#[test]
fn merge_hooks_later_wins_per_key() {
    let mut base = serde_json::json!({
        "Stop": ["global-stop"],
        "PreToolUse": ["global-pre"],
    });
    let overlay = serde_json::json!({
        "Stop": ["role-stop"],
        "PreCompact": ["role-compact"],
    });

    merge_hooks(&mut base, overlay);

    assert_eq!(base["Stop"], serde_json::json!(["role-stop"]));
    assert_eq!(base["PreToolUse"], serde_json::json!(["global-pre"]));
    assert_eq!(base["PreCompact"], serde_json::json!(["role-compact"]));
}

#[tokio::test]
async fn materialize_without_tracker_uses_defaults() {
    let hooks = materialize(None, "worker").await;
    assert_eq!(hooks, default_hooks());
}

#[tokio::test]
async fn materialize_merges_global_and_role_records() {
    use roost_tracker::test_support::{StubResponse, StubServer};

    let global = serde_json::json!([{
        "id": "bd-g", "type": "config", "title": "global hooks", "status": "open",
        "fields": {"hooks": {"Stop": ["global-stop"], "PreToolUse": ["global-pre"]}}
    }]);
    let role = serde_json::json!([{
        "id": "bd-r", "type": "config", "title": "reviewer hooks", "status": "open",
        "fields": {"hooks": {"Stop": ["reviewer-stop"]}}
    }]);
    let server = StubServer::start(vec![
        StubResponse::json(200, global.to_string()),
        StubResponse::json(200, role.to_string()),
    ])
    .await;
    let tracker = roost_tracker::TrackerClient::new(&server.url, "t").unwrap();

    let hooks = materialize(Some(&tracker), "reviewer").await;

    assert_eq!(hooks["Stop"], serde_json::json!(["reviewer-stop"]));
    assert_eq!(hooks["PreToolUse"], serde_json::json!(["global-pre"]));

    let paths: Vec<String> = server.requests().iter().map(|r| r.path.clone()).collect();
    assert!(paths[0].contains("label=hooks%3Aglobal") || paths[0].contains("label=hooks:global"));
    assert!(paths[1].contains("hooks%3Areviewer") || paths[1].contains("hooks:reviewer"));
}

#[tokio::test]
async fn materialize_falls_back_when_records_missing() {
    use roost_tracker::test_support::{StubResponse, StubServer};

    let server = StubServer::start(vec![
        StubResponse::json(200, "[]"),
        StubResponse::json(200, "[]"),
    ])
    .await;
    let tracker = roost_tracker::TrackerClient::new(&server.url, "t").unwrap();

    let hooks = materialize(Some(&tracker), "worker").await;
    assert_eq!(hooks, default_hooks());
}
