// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential provisioning and background refresh.
//!
//! Provisioning runs a five-priority cascade at boot and reports which
//! source won; the refresh task then keeps an OAuth credential fresh for
//! the life of the process. The credentials file is written only via
//! temp-file + rename, so the child always reads either the old or the
//! new complete document — never a torn one.

use crate::config::Config;
use crate::coop::{CoopAgentState, CoopClient};
use crate::env;
use serde::Deserialize;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// OAuth client id registered for the model CLI.
const OAUTH_CLIENT_ID: &str = "9d1c250a-e61b-44d9-88ed-5944d1962f5e";

/// Refresh when the token expires within this window.
const REFRESH_WINDOW: Duration = Duration::from_secs(60 * 60);

/// Consecutive refresh failures before consulting the child.
const FAILURE_LIMIT: u32 = 5;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("credential io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("credential file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("credential file has no claudeAiOauth entry")]
    NotOauth,

    #[error("oauth refresh request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("oauth endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("oauth response missing {0}")]
    MissingField(&'static str),
}

/// Which cascade priority provided the credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialMode {
    None,
    Volume,
    Secret,
    EnvOauth,
    EnvApiKey,
    RegistryFetch,
}

impl CredentialMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialMode::None => "none",
            CredentialMode::Volume => "volume",
            CredentialMode::Secret => "secret",
            CredentialMode::EnvOauth => "env-oauth",
            CredentialMode::EnvApiKey => "env-apikey",
            CredentialMode::RegistryFetch => "registry-fetch",
        }
    }
}

impl std::fmt::Display for CredentialMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run the credential cascade, stopping at the first source that works.
///
/// Total failure is not fatal: the model may authenticate through env
/// set later, or fail visibly at startup.
pub async fn provision(cfg: &Config) -> CredentialMode {
    let canonical = cfg.credentials_path();

    // 1. Existing credentials on the persistent volume.
    if read_oauth_entry(&canonical).is_ok() {
        tracing::info!(path = %canonical.display(), "using existing credentials file");
        return CredentialMode::Volume;
    }

    // 2. Staged credentials from a secret mount.
    let staged = env::staged_credentials_path();
    if staged.is_file() {
        match stage_credentials(&staged, &canonical) {
            Ok(()) => {
                tracing::info!(from = %staged.display(), "staged credentials installed");
                return CredentialMode::Secret;
            }
            Err(e) => tracing::warn!(error = %e, "failed to install staged credentials"),
        }
    }

    // 3. Ambient OAuth token — the model CLI writes its own file.
    if !cfg.oauth_token.is_empty() {
        tracing::info!("using ambient oauth token from environment");
        return CredentialMode::EnvOauth;
    }

    // 4. Static API key — no credentials file needed at all.
    if !cfg.api_key.is_empty() {
        tracing::info!("using static api key from environment");
        return CredentialMode::EnvApiKey;
    }

    // 5. Fetch from the registry's distribute endpoint.
    if !cfg.registry_url.is_empty() {
        match fetch_from_registry(cfg, &canonical).await {
            Ok(()) => {
                tracing::info!("credentials fetched from registry");
                return CredentialMode::RegistryFetch;
            }
            Err(e) => tracing::warn!(error = %e, "registry credential fetch failed"),
        }
    }

    tracing::warn!("no credential source available, model may fail to authenticate");
    CredentialMode::None
}

fn stage_credentials(staged: &Path, canonical: &Path) -> Result<(), CredentialError> {
    if let Some(parent) = canonical.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = std::fs::read(staged)?;
    write_atomic(canonical, &content)?;
    std::fs::set_permissions(canonical, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}

async fn fetch_from_registry(cfg: &Config, canonical: &Path) -> Result<(), CredentialError> {
    let http = reqwest::Client::builder().timeout(Duration::from_secs(15)).build()?;
    let url = format!(
        "{}/api/v1/credentials/distribute",
        cfg.registry_url.trim_end_matches('/')
    );
    let mut request = http
        .post(url)
        .json(&serde_json::json!({ "session_id": cfg.session_id.as_str() }));
    if !cfg.registry_token.is_empty() {
        request = request.bearer_auth(&cfg.registry_token);
    }
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(CredentialError::Status {
            status: status.as_u16(),
            body: body.trim().to_string(),
        });
    }

    // The body is the credentials document; verify the shape, then
    // write it verbatim.
    let body = response.text().await?;
    let value: serde_json::Value = serde_json::from_str(&body)?;
    if value.get("claudeAiOauth").and_then(|o| o.get("accessToken")).is_none() {
        return Err(CredentialError::NotOauth);
    }
    if let Some(parent) = canonical.parent() {
        std::fs::create_dir_all(parent)?;
    }
    write_atomic(canonical, body.as_bytes())?;
    std::fs::set_permissions(canonical, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}

// ---- Refresh loop ----

/// Why the refresh task ended.
#[derive(Debug, PartialEq, Eq)]
pub enum RefreshExit {
    Cancelled,
    /// Five consecutive failures with a non-responsive child: the pod
    /// should be rescheduled for fresh credentials.
    CircuitBroken,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum RefreshDecision {
    /// Externally managed credential; never touch it.
    Sentinel,
    /// More than the refresh window left; nothing to do.
    Fresh,
    Refresh,
}

pub(crate) fn refresh_decision(expires_at_ms: u64, now_ms: u64, sentinel_ms: u64) -> RefreshDecision {
    if expires_at_ms >= sentinel_ms {
        return RefreshDecision::Sentinel;
    }
    if expires_at_ms.saturating_sub(now_ms) > REFRESH_WINDOW.as_millis() as u64 {
        return RefreshDecision::Fresh;
    }
    RefreshDecision::Refresh
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
}

/// Long-lived background task keeping the OAuth credential fresh.
pub async fn refresh_loop(
    cfg: &Config,
    mode: CredentialMode,
    coop: &CoopClient,
    cancel: CancellationToken,
) -> RefreshExit {
    if mode == CredentialMode::EnvApiKey {
        tracing::info!("static api key in use, refresh loop not needed");
        return RefreshExit::Cancelled;
    }

    tokio::select! {
        _ = cancel.cancelled() => return RefreshExit::Cancelled,
        _ = tokio::time::sleep(env::refresh_initial_delay()) => {}
    }

    let mut failures: u32 = 0;
    loop {
        match refresh_once(&cfg.credentials_path()).await {
            Ok(outcome) => {
                if outcome == RefreshOutcome::Refreshed {
                    tracing::info!("credentials refreshed");
                }
                failures = 0;
            }
            Err(e) => {
                failures += 1;
                tracing::warn!(error = %e, failures, "credential refresh failed");
                if failures >= FAILURE_LIMIT {
                    // A working child means its credential is still good;
                    // give the cycle another round. Anything else and the
                    // pod is better off rescheduled.
                    match coop.agent().await.map(|a| a.state) {
                        Ok(CoopAgentState::Working) | Ok(CoopAgentState::Idle) => {
                            tracing::info!("child healthy despite refresh failures, resetting");
                            failures = 0;
                        }
                        state => {
                            tracing::error!(
                                ?state,
                                "credential refresh circuit breaker fired"
                            );
                            return RefreshExit::CircuitBroken;
                        }
                    }
                }
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => return RefreshExit::Cancelled,
            _ = tokio::time::sleep(env::refresh_interval()) => {}
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum RefreshOutcome {
    Skipped,
    Refreshed,
}

/// One refresh cycle over the credentials file.
pub(crate) async fn refresh_once(path: &Path) -> Result<RefreshOutcome, CredentialError> {
    let (mut document, oauth) = read_oauth_entry(path)?;

    let refresh_token = oauth
        .get("refreshToken")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or(CredentialError::MissingField("refreshToken"))?
        .to_string();
    let expires_at = oauth.get("expiresAt").and_then(|v| v.as_u64()).unwrap_or(0);

    let now_ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64;

    match refresh_decision(expires_at, now_ms, env::credential_sentinel_ms()) {
        RefreshDecision::Sentinel | RefreshDecision::Fresh => return Ok(RefreshOutcome::Skipped),
        RefreshDecision::Refresh => {}
    }

    let http = reqwest::Client::builder().timeout(Duration::from_secs(15)).build()?;
    let response = http
        .post(env::oauth_token_url())
        .json(&serde_json::json!({
            "grant_type": "refresh_token",
            "refresh_token": refresh_token,
            "client_id": OAUTH_CLIENT_ID,
        }))
        .send()
        .await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(CredentialError::Status {
            status: status.as_u16(),
            body: body.trim().to_string(),
        });
    }

    let token: TokenResponse = response.json().await?;
    let access_token = token
        .access_token
        .filter(|s| !s.is_empty())
        .ok_or(CredentialError::MissingField("access_token"))?;
    let new_refresh_token = token
        .refresh_token
        .filter(|s| !s.is_empty())
        .ok_or(CredentialError::MissingField("refresh_token"))?;
    let expires_in = token.expires_in.unwrap_or(3600);

    if let Some(oauth) = document
        .get_mut("claudeAiOauth")
        .and_then(|v| v.as_object_mut())
    {
        oauth.insert("accessToken".to_string(), access_token.into());
        oauth.insert("refreshToken".to_string(), new_refresh_token.into());
        oauth.insert(
            "expiresAt".to_string(),
            serde_json::json!(now_ms + expires_in * 1000),
        );
    }

    write_atomic(path, serde_json::to_string(&document)?.as_bytes())?;
    Ok(RefreshOutcome::Refreshed)
}

fn read_oauth_entry(
    path: &Path,
) -> Result<(serde_json::Value, serde_json::Map<String, serde_json::Value>), CredentialError> {
    let content = std::fs::read_to_string(path)?;
    let document: serde_json::Value = serde_json::from_str(&content)?;
    let oauth = document
        .get("claudeAiOauth")
        .and_then(|v| v.as_object())
        .cloned()
        .ok_or(CredentialError::NotOauth)?;
    Ok((document, oauth))
}

/// Temp-file + rename so readers never see a partial document.
fn write_atomic(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, path)
}

#[cfg(test)]
#[path = "credentials_tests.rs"]
mod tests;
