// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use roost_tracker::test_support::{StubResponse, StubServer};
use crate::test_support::test_config;
use serial_test::serial;

const SENTINEL: u64 = 9_999_999_999_000;
const HOUR_MS: u64 = 60 * 60 * 1000;

fn write_credentials(path: &Path, refresh_token: &str, expires_at: u64) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let document = serde_json::json!({
        "claudeAiOauth": {
            "accessToken": "a1",
            "refreshToken": refresh_token,
            "expiresAt": expires_at,
            "scopes": ["user:inference"],
        }
    });
    std::fs::write(path, document.to_string()).unwrap();
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}

#[yare::parameterized(
    sentinel_exact = { SENTINEL, 0, RefreshDecision::Sentinel },
    sentinel_above = { SENTINEL + 5, 0, RefreshDecision::Sentinel },
    fresh          = { 2 * HOUR_MS, 0, RefreshDecision::Fresh },
    inside_window  = { HOUR_MS - 1, 0, RefreshDecision::Refresh },
    expired        = { 100, 200, RefreshDecision::Refresh },
)]
fn refresh_decision_cases(expires_at: u64, now: u64, expected: RefreshDecision) {
    assert_eq!(refresh_decision(expires_at, now, SENTINEL), expected);
}

#[yare::parameterized(
    none           = { CredentialMode::None, "none" },
    volume         = { CredentialMode::Volume, "volume" },
    secret         = { CredentialMode::Secret, "secret" },
    env_oauth      = { CredentialMode::EnvOauth, "env-oauth" },
    env_apikey     = { CredentialMode::EnvApiKey, "env-apikey" },
    registry_fetch = { CredentialMode::RegistryFetch, "registry-fetch" },
)]
fn mode_tags(mode: CredentialMode, tag: &str) {
    assert_eq!(mode.as_str(), tag);
}

#[tokio::test]
#[serial]
async fn refresh_noop_when_credential_is_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".credentials.json");
    write_credentials(&path, "rt1", now_ms() + 2 * HOUR_MS);
    let before = std::fs::read(&path).unwrap();

    let outcome = refresh_once(&path).await.unwrap();

    assert_eq!(outcome, RefreshOutcome::Skipped);
    assert_eq!(std::fs::read(&path).unwrap(), before);
}

#[tokio::test]
#[serial]
async fn refresh_noop_for_sentinel_credential() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".credentials.json");
    write_credentials(&path, "rt1", SENTINEL);
    let before = std::fs::read(&path).unwrap();

    let outcome = refresh_once(&path).await.unwrap();

    assert_eq!(outcome, RefreshOutcome::Skipped);
    assert_eq!(std::fs::read(&path).unwrap(), before);
}

#[tokio::test]
#[serial]
async fn refresh_rotates_tokens_and_expiry() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".credentials.json");
    write_credentials(&path, "rt1", now_ms() + 45 * 60 * 1000);

    let server = StubServer::start(vec![StubResponse::json(
        200,
        r#"{"access_token": "a2", "refresh_token": "rt2", "expires_in": 3600}"#,
    )])
    .await;
    std::env::set_var("ROOST_OAUTH_TOKEN_URL", format!("{}/v1/oauth/token", server.url));

    let outcome = refresh_once(&path).await.unwrap();
    std::env::remove_var("ROOST_OAUTH_TOKEN_URL");

    assert_eq!(outcome, RefreshOutcome::Refreshed);

    // The request carried the refresh grant.
    let body: serde_json::Value =
        serde_json::from_str(&server.requests()[0].body).unwrap();
    assert_eq!(body["grant_type"], serde_json::json!("refresh_token"));
    assert_eq!(body["refresh_token"], serde_json::json!("rt1"));

    // The file parses, carries both tokens, and the new expiry is about
    // an hour out.
    let document: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let oauth = &document["claudeAiOauth"];
    assert_eq!(oauth["accessToken"], serde_json::json!("a2"));
    assert_eq!(oauth["refreshToken"], serde_json::json!("rt2"));
    let expires_at = oauth["expiresAt"].as_u64().unwrap();
    let delta = expires_at.saturating_sub(now_ms());
    assert!(delta > 59 * 60 * 1000 && delta <= HOUR_MS, "delta: {delta}");

    // Untouched entries survive the rewrite.
    assert_eq!(oauth["scopes"][0], serde_json::json!("user:inference"));

    // Atomic write leaves no temp file behind.
    assert!(!path.with_extension("tmp").exists());
}

#[tokio::test]
#[serial]
async fn refresh_fails_when_response_missing_token() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".credentials.json");
    write_credentials(&path, "rt1", now_ms() + 1000);

    let server = StubServer::start(vec![StubResponse::json(
        200,
        r#"{"access_token": "a2", "expires_in": 3600}"#,
    )])
    .await;
    std::env::set_var("ROOST_OAUTH_TOKEN_URL", format!("{}/v1/oauth/token", server.url));

    let err = refresh_once(&path).await.unwrap_err();
    std::env::remove_var("ROOST_OAUTH_TOKEN_URL");

    assert!(matches!(err, CredentialError::MissingField("refresh_token")));
}

#[tokio::test]
#[serial]
async fn cascade_prefers_existing_volume_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = test_config(dir.path());
    write_credentials(&cfg.credentials_path(), "rt1", SENTINEL);

    assert_eq!(provision(&cfg).await, CredentialMode::Volume);
}

#[tokio::test]
#[serial]
async fn cascade_installs_staged_secret() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = test_config(dir.path());
    let staged = dir.path().join("secret").join(".credentials.json");
    write_credentials(&staged, "rt1", SENTINEL);
    std::env::set_var("ROOST_STAGED_CREDENTIALS", &staged);

    let mode = provision(&cfg).await;
    std::env::remove_var("ROOST_STAGED_CREDENTIALS");

    assert_eq!(mode, CredentialMode::Secret);
    let canonical = cfg.credentials_path();
    assert!(canonical.is_file());
    let mode_bits = std::fs::metadata(&canonical).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode_bits, 0o600);
}

#[tokio::test]
#[serial]
async fn cascade_env_oauth_beats_api_key() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = test_config(dir.path());
    cfg.oauth_token = "oat".to_string();
    cfg.api_key = "sk-test".to_string();
    std::env::remove_var("ROOST_STAGED_CREDENTIALS");

    assert_eq!(provision(&cfg).await, CredentialMode::EnvOauth);
}

#[tokio::test]
#[serial]
async fn cascade_api_key_mode() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = test_config(dir.path());
    cfg.api_key = "sk-test".to_string();
    std::env::remove_var("ROOST_STAGED_CREDENTIALS");

    assert_eq!(provision(&cfg).await, CredentialMode::EnvApiKey);
}

#[tokio::test]
#[serial]
async fn cascade_fetches_from_registry() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = test_config(dir.path());
    std::env::remove_var("ROOST_STAGED_CREDENTIALS");

    let body = r#"{"claudeAiOauth": {"accessToken": "a9", "refreshToken": "rt9", "expiresAt": 1}}"#;
    let server = StubServer::start(vec![StubResponse::json(200, body)]).await;
    cfg.registry_url = server.url.clone();

    let mode = provision(&cfg).await;

    assert_eq!(mode, CredentialMode::RegistryFetch);
    // Body written verbatim.
    assert_eq!(std::fs::read_to_string(cfg.credentials_path()).unwrap(), body);

    let requests = server.requests();
    assert_eq!(requests[0].path, "/api/v1/credentials/distribute");
    let sent: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(sent["session_id"], serde_json::json!("boot-1"));
}

#[tokio::test]
#[serial]
async fn cascade_total_failure_is_none() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = test_config(dir.path());
    std::env::remove_var("ROOST_STAGED_CREDENTIALS");

    assert_eq!(provision(&cfg).await, CredentialMode::None);
}

#[tokio::test]
async fn refresh_loop_skips_for_api_key_mode() {
    let cfg = test_config(Path::new("/nonexistent"));
    let coop = CoopClient::new(1, 2).unwrap();
    let cancel = CancellationToken::new();

    let exit = refresh_loop(&cfg, CredentialMode::EnvApiKey, &coop, cancel).await;
    assert_eq!(exit, RefreshExit::Cancelled);
}
