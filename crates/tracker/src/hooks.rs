// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hook-event emission.
//!
//! The model harness fires lifecycle hooks (Stop, PreToolUse, ...); the
//! CLI forwards each to the tracker, which evaluates the agent's gates
//! and answers with a verdict. A pending `decision` gate comes back as
//! `block=true` with a reason the model sees verbatim.

use crate::client::{TrackerClient, REQUEST_TIMEOUT};
use crate::error::TrackerError;
use roost_core::BeadId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Transient-failure retry schedule for hook emission.
pub const RETRY_SCHEDULE: [Duration; 4] = [
    Duration::from_secs(5),
    Duration::from_secs(30),
    Duration::from_secs(60),
    Duration::from_secs(300),
];

/// A lifecycle hook event forwarded to the tracker.
#[derive(Debug, Clone, Serialize)]
pub struct HookEvent {
    pub agent_bead_id: BeadId,
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl HookEvent {
    pub fn new(agent: BeadId, event: impl Into<String>) -> Self {
        Self { agent_bead_id: agent, event: event.into(), payload: None }
    }
}

/// The tracker's answer to a hook event.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HookVerdict {
    #[serde(default)]
    pub block: bool,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl TrackerClient {
    /// Emit one hook event without retries.
    pub async fn emit_hook(&self, event: &HookEvent) -> Result<HookVerdict, TrackerError> {
        let response = self
            .request(reqwest::Method::POST, "/hooks/emit")
            .json(event)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TrackerError::Status { status: status.as_u16(), body: body.trim().to_string() });
        }
        Ok(response.json().await?)
    }

    /// Emit a hook event, retrying transient failures on the fixed
    /// schedule (5s, 30s, 1m, 5m) before surfacing the error.
    pub async fn emit_hook_with_retry(&self, event: &HookEvent) -> Result<HookVerdict, TrackerError> {
        let mut last_err = None;
        for (attempt, delay) in std::iter::once(None)
            .chain(RETRY_SCHEDULE.iter().copied().map(Some))
            .enumerate()
        {
            if let Some(delay) = delay {
                tracing::warn!(
                    attempt,
                    delay_secs = delay.as_secs(),
                    "hook emit failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            match self.emit_hook(event).await {
                Ok(verdict) => return Ok(verdict),
                Err(e) if e.is_transient() => last_err = Some(e),
                Err(e) => return Err(e),
            }
        }
        Err(last_err.unwrap_or(TrackerError::StreamClosed))
    }
}

#[cfg(test)]
#[path = "hooks_tests.rs"]
mod tests;
