// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The supervisor's frozen configuration.
//!
//! Built once at boot from flags and environment (the CLI layer owns the
//! flag/env precedence); every subsystem takes it by reference and
//! nothing mutates it afterwards. Path helpers centralize the
//! persistent-volume layout so the provisioner, credential manager, and
//! session loop agree on where things live.

use roost_core::{BeadId, SessionId};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("tracker URL is required (--tracker-url or ROOST_TRACKER_URL)")]
    MissingTrackerUrl,

    #[error("agent bead id is required (--agent-bead or ROOST_AGENT_BEAD)")]
    MissingAgentBead,

    #[error("max restarts must be at least 1, got {0}")]
    InvalidMaxRestarts(u32),
}

/// Immutable process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub workspace: PathBuf,
    pub coop_port: u16,
    pub coop_health_port: u16,
    pub max_restarts: u32,
    pub agent_command: String,
    pub resume_enabled: bool,
    pub role: String,
    pub project: String,
    pub agent_name: String,
    pub agent_bead: Option<BeadId>,
    pub pod_name: String,
    pub pod_ip: String,
    pub tracker_url: String,
    pub tracker_token: String,
    pub registry_url: String,
    pub registry_token: String,
    pub oauth_token: String,
    pub api_key: String,
    pub git_user_name: String,
    pub git_user_email: String,
    pub git_token: String,
    /// Env var names forwarded into the child untouched.
    pub passthrough_env: Vec<String>,
    /// Fresh per boot; keys the registry entry and credential fetch.
    pub session_id: SessionId,
}

impl Config {
    /// Startup-time validation; failures carry a human-readable
    /// diagnostic and abort the process with a nonzero code.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tracker_url.is_empty() {
            return Err(ConfigError::MissingTrackerUrl);
        }
        if self.agent_bead.is_none() {
            return Err(ConfigError::MissingAgentBead);
        }
        if self.max_restarts < 1 {
            return Err(ConfigError::InvalidMaxRestarts(self.max_restarts));
        }
        Ok(())
    }

    // ---- Persistent-volume layout ----

    pub fn beads_dir(&self) -> PathBuf {
        self.workspace.join(".beads")
    }

    pub fn tracker_config_path(&self) -> PathBuf {
        self.beads_dir().join("config.json")
    }

    pub fn worktrees_dir(&self) -> PathBuf {
        self.beads_dir().join("worktrees")
    }

    pub fn state_dir(&self) -> PathBuf {
        self.workspace.join(".state")
    }

    pub fn claude_state_dir(&self) -> PathBuf {
        self.state_dir().join("claude")
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.claude_state_dir().join("sessions")
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.claude_state_dir().join(".credentials.json")
    }

    pub fn coop_base_url(&self) -> String {
        format!("http://localhost:{}", self.coop_port)
    }

    /// The URL peers use to reach this pod's coop, written into the
    /// agent record's notes.
    pub fn coop_public_url(&self) -> String {
        if self.pod_ip.is_empty() {
            self.coop_base_url()
        } else {
            format!("http://{}:{}", self.pod_ip, self.coop_port)
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
