// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hook handlers wired into the model harness.
//!
//! The harness pipes each lifecycle event here; the tracker evaluates
//! the agent's gates and answers with a verdict. A pending decision
//! gate comes back as `block=true`, which becomes exit code 2 with a
//! `{"decision":"block","reason":...}` payload on stderr — the shape
//! the harness uses to keep the turn open. Tracker failures after the
//! retry schedule become exit code 1.

use super::TrackerArgs;
use crate::exit_error::ExitError;
use anyhow::Result;
use roost_tracker::{HookEvent, HookVerdict};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, clap::Subcommand)]
pub enum HookCommand {
    /// Forward one hook event to the tracker and translate the verdict.
    Emit {
        /// Hook type (Stop, PreToolUse, ...).
        event: String,

        #[arg(long, env = "ROOST_AGENT_BEAD")]
        agent: Option<String>,

        #[command(flatten)]
        tracker: TrackerArgs,
    },
}

/// The slice of the harness's stdin payload the supervisor cares about.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct HookInput {
    #[serde(default)]
    stop_hook_active: bool,
}

/// A truthy `stop_hook_active` means we are already inside a stop-hook
/// chain; blocking again would loop the harness forever.
pub(crate) fn allows_immediate_exit(event: &str, input: &HookInput) -> bool {
    event == "Stop" && input.stop_hook_active
}

/// Map the tracker's verdict onto the process contract: block → exit 2
/// with the structured stderr line, otherwise exit 0 (warnings don't
/// change the outcome).
pub(crate) fn verdict_to_result(verdict: &HookVerdict) -> Result<()> {
    for warning in &verdict.warnings {
        tracing::warn!(%warning, "hook warning");
    }
    if verdict.block {
        let payload = serde_json::json!({
            "decision": "block",
            "reason": verdict.reason,
        });
        return Err(ExitError::new(2, payload.to_string()).into());
    }
    Ok(())
}

pub async fn run(command: HookCommand) -> Result<()> {
    match command {
        HookCommand::Emit { event, agent, tracker } => emit(event, agent, tracker).await,
    }
}

async fn emit(event: String, agent: Option<String>, tracker: TrackerArgs) -> Result<()> {
    let input = read_hook_input();
    if allows_immediate_exit(&event, &input) {
        return Ok(());
    }

    let agent = super::resolve_agent(&agent)?;
    let client = tracker.client()?;

    let verdict = client
        .emit_hook_with_retry(&HookEvent::new(agent, event))
        .await
        .map_err(|e| ExitError::new(1, format!("hook emit failed: {}", e)))?;

    verdict_to_result(&verdict)
}

/// Parse the harness payload from stdin; malformed input is treated as
/// an empty payload rather than an error.
fn read_hook_input() -> HookInput {
    let mut raw = String::new();
    if std::io::stdin().read_to_string(&mut raw).is_err() {
        return HookInput::default();
    }
    serde_json::from_str(&raw).unwrap_or_default()
}

#[cfg(test)]
#[path = "hook_tests.rs"]
mod tests;
