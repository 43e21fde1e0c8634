// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client for the local coop child.
//!
//! Coop exposes screen and input control for the wrapped model CLI at
//! `http://localhost:<port>/api/v1`. Every call here is a control-plane
//! poll with a 3-second deadline; helpers tolerate failures and keep
//! polling.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const COOP_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Error)]
pub enum CoopError {
    #[error("coop request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("coop returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// Agent state as reported by coop's `/agent` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum CoopAgentState {
    Starting,
    Working,
    Idle,
    Exited,
    Other(String),
}

impl From<String> for CoopAgentState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "starting" => CoopAgentState::Starting,
            "working" => CoopAgentState::Working,
            "idle" => CoopAgentState::Idle,
            "exited" => CoopAgentState::Exited,
            _ => CoopAgentState::Other(s),
        }
    }
}

/// An interactive prompt coop has detected on screen.
#[derive(Debug, Clone, Deserialize)]
pub struct CoopPrompt {
    #[serde(rename = "type")]
    pub prompt_type: String,
}

/// Response body of `GET /agent`.
#[derive(Debug, Clone, Deserialize)]
pub struct CoopAgent {
    pub state: CoopAgentState,
    #[serde(default)]
    pub prompt: Option<CoopPrompt>,
}

#[derive(Serialize)]
struct KeysRequest<'a> {
    keys: &'a [&'a str],
}

#[derive(Serialize)]
struct RespondRequest<'a> {
    option: &'a str,
}

#[derive(Serialize)]
struct NudgeRequest<'a> {
    message: &'a str,
}

#[derive(Deserialize)]
struct ScreenText {
    #[serde(default)]
    text: String,
}

/// Client over one coop instance's local API.
#[derive(Clone)]
pub struct CoopClient {
    http: reqwest::Client,
    base: String,
    health_base: String,
}

impl CoopClient {
    pub fn new(port: u16, health_port: u16) -> Result<Self, CoopError> {
        let http = reqwest::Client::builder().timeout(COOP_TIMEOUT).build()?;
        Ok(Self {
            http,
            base: format!("http://localhost:{}/api/v1", port),
            health_base: format!("http://localhost:{}/api/v1", health_port),
        })
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, CoopError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(CoopError::Status { status: status.as_u16(), body: body.trim().to_string() })
    }

    pub async fn agent(&self) -> Result<CoopAgent, CoopError> {
        let response = self.http.get(format!("{}/agent", self.base)).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn screen_text(&self) -> Result<String, CoopError> {
        let response = self.http.get(format!("{}/screen/text", self.base)).send().await?;
        let screen: ScreenText = Self::check(response).await?.json().await?;
        Ok(screen.text)
    }

    pub async fn send_keys(&self, keys: &[&str]) -> Result<(), CoopError> {
        let response = self
            .http
            .post(format!("{}/input/keys", self.base))
            .json(&KeysRequest { keys })
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Answer a detected interactive prompt by option number.
    pub async fn respond(&self, option: &str) -> Result<(), CoopError> {
        let response = self
            .http
            .post(format!("{}/agent/respond", self.base))
            .json(&RespondRequest { option })
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    pub async fn nudge(&self, message: &str) -> Result<(), CoopError> {
        let response = self
            .http
            .post(format!("{}/agent/nudge", self.base))
            .json(&NudgeRequest { message })
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Ask coop to shut itself down. Best-effort by nature.
    pub async fn shutdown(&self) -> Result<(), CoopError> {
        let response = self.http.post(format!("{}/shutdown", self.base)).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Whether the health endpoint answers 200.
    pub async fn healthy(&self) -> bool {
        self.http
            .get(format!("{}/health", self.health_base))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}

#[cfg(test)]
#[path = "coop_tests.rs"]
mod tests;
