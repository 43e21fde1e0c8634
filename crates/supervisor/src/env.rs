// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for supervisor tunables.
//!
//! The primary configuration comes in through flags (see the CLI crate);
//! these are the operational knobs that only ever change in tests or
//! unusual deployments.

use std::path::PathBuf;
use std::time::Duration;

/// Platform-version file baked into the pod image.
pub fn platform_version_file() -> PathBuf {
    std::env::var("ROOST_PLATFORM_VERSION_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/etc/platform-version"))
}

/// Staged credentials from an external secret mount.
pub fn staged_credentials_path() -> PathBuf {
    std::env::var("ROOST_STAGED_CREDENTIALS")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/secrets/claude/.credentials.json"))
}

/// OAuth token endpoint; overridden in tests.
pub fn oauth_token_url() -> String {
    std::env::var("ROOST_OAUTH_TOKEN_URL")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "https://console.anthropic.com/v1/oauth/token".to_string())
}

/// `expiresAt` values at or above this are externally managed and never
/// refreshed. The default matches the tracker's convention.
pub fn credential_sentinel_ms() -> u64 {
    std::env::var("ROOST_CREDENTIAL_SENTINEL_MS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(9_999_999_999_000)
}

/// Coop readiness poll interval used by registry registration.
pub fn coop_ready_poll() -> Duration {
    std::env::var("ROOST_COOP_READY_POLL_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(2))
}

/// Credential refresh tick; production default five minutes.
pub fn refresh_interval() -> Duration {
    std::env::var("ROOST_REFRESH_INTERVAL_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(300))
}

/// Delay before the first credential refresh check.
pub fn refresh_initial_delay() -> Duration {
    std::env::var("ROOST_REFRESH_INITIAL_DELAY_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(30))
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
