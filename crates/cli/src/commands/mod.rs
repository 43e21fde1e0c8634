// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subcommand implementations.

pub mod artifact;
pub mod decision;
pub mod gate;
pub mod hook;
pub mod run;
pub mod worktree;
pub mod yield_cmd;

use crate::exit_error::ExitError;
use anyhow::Result;
use roost_core::BeadId;
use roost_tracker::TrackerClient;

/// Tracker connection flags shared by the protocol subcommands. These
/// run inside the pod, where the supervisor has already exported the
/// tracker env.
#[derive(Debug, clap::Args)]
pub struct TrackerArgs {
    #[arg(long, env = "ROOST_TRACKER_URL", default_value = "", hide_env_values = true)]
    pub tracker_url: String,

    #[arg(long, env = "ROOST_TRACKER_TOKEN", default_value = "", hide_env_values = true)]
    pub tracker_token: String,
}

impl TrackerArgs {
    pub fn client(&self) -> Result<TrackerClient> {
        if self.tracker_url.is_empty() {
            return Err(ExitError::new(
                1,
                "tracker URL is required (--tracker-url or ROOST_TRACKER_URL)",
            )
            .into());
        }
        Ok(TrackerClient::new(&self.tracker_url, &self.tracker_token)?)
    }
}

/// Resolve the agent bead id from a flag or the pod environment.
pub fn resolve_agent(flag: &Option<String>) -> Result<BeadId> {
    if let Some(agent) = flag.as_ref().filter(|s| !s.is_empty()) {
        return Ok(BeadId::new(agent.clone()));
    }
    match std::env::var("ROOST_AGENT_BEAD") {
        Ok(agent) if !agent.is_empty() => Ok(BeadId::new(agent)),
        _ => Err(ExitError::new(
            1,
            "agent bead id is required (--agent or ROOST_AGENT_BEAD)",
        )
        .into()),
    }
}
