// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-session helper tasks.
//!
//! Three short-lived cooperative tasks accompany every coop session:
//! one steps the model CLI past interactive startup prompts, one injects
//! the first work prompt once the child goes idle, and one notices a
//! child that exited on its own and shuts its coop down. All three poll
//! the local coop API and treat cancellation of the session token as an
//! immediate stop.

use crate::coop::{CoopAgent, CoopAgentState, CoopClient};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const POLL_INTERVAL: Duration = Duration::from_secs(2);
const PROMPT_SETTLE: Duration = Duration::from_secs(3);
const BYPASS_ATTEMPTS: u32 = 30;
const NUDGE_ATTEMPTS: u32 = 60;
const SETUP_FALSE_POSITIVE_LIMIT: u32 = 5;
const EXIT_MONITOR_INITIAL_DELAY: Duration = Duration::from_secs(10);
const EXIT_MONITOR_INTERVAL: Duration = Duration::from_secs(5);

/// Sleep unless the session ends first; true means cancelled.
async fn sleep_or_cancel(cancel: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => true,
        _ = tokio::time::sleep(duration) => false,
    }
}

/// What the bypass helper should do with the current tick's observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BypassAction {
    /// Child reached a settled state; the helper is finished.
    Done,
    /// Dismiss the session-resume picker (the supervisor already made
    /// the resume decision via coop's `--resume`).
    DismissResumePicker,
    /// Accept the custom-API-key confirmation.
    AcceptApiKey,
    /// Decline the first-run setup prompt (option 2).
    DeclineSetup,
    /// Prompt claims `setup` but the screen doesn't look like it.
    SetupFalsePositive,
    /// Nothing recognizable; poll again.
    Wait,
}

/// Pure per-tick decision for the startup bypass.
pub(crate) fn bypass_action(agent: &CoopAgent, screen: &str) -> BypassAction {
    match agent.state {
        CoopAgentState::Idle | CoopAgentState::Working => return BypassAction::Done,
        CoopAgentState::Starting => {
            if screen.contains("Resume Session") {
                return BypassAction::DismissResumePicker;
            }
            if screen.contains("Detected a custom API key") {
                return BypassAction::AcceptApiKey;
            }
        }
        _ => {}
    }

    let is_setup_prompt = agent
        .prompt
        .as_ref()
        .map(|p| p.prompt_type == "setup")
        .unwrap_or(false);
    if is_setup_prompt {
        if screen.contains("No, exit") {
            return BypassAction::DeclineSetup;
        }
        return BypassAction::SetupFalsePositive;
    }

    BypassAction::Wait
}

/// Step the child past known startup prompts until it reaches a settled
/// state. Gives up after 30 polls, or after five consecutive
/// false-positive setup prompts (the screen matcher is wrong for this
/// CLI version).
pub async fn startup_prompt_bypass(coop: CoopClient, cancel: CancellationToken) {
    let mut setup_false_positives: u32 = 0;

    for _ in 0..BYPASS_ATTEMPTS {
        if cancel.is_cancelled() {
            return;
        }

        let agent = match coop.agent().await {
            Ok(agent) => agent,
            Err(_) => {
                if sleep_or_cancel(&cancel, POLL_INTERVAL).await {
                    return;
                }
                continue;
            }
        };

        let screen = coop.screen_text().await.unwrap_or_default();
        match bypass_action(&agent, &screen) {
            BypassAction::Done => {
                tracing::debug!("child past startup");
                return;
            }
            BypassAction::DismissResumePicker => {
                tracing::info!("dismissing resume-session prompt");
                let _ = coop.send_keys(&["Escape"]).await;
                if sleep_or_cancel(&cancel, PROMPT_SETTLE).await {
                    return;
                }
                continue;
            }
            BypassAction::AcceptApiKey => {
                tracing::info!("accepting custom api key prompt");
                let _ = coop.send_keys(&["Up", "Return"]).await;
                if sleep_or_cancel(&cancel, PROMPT_SETTLE).await {
                    return;
                }
                continue;
            }
            BypassAction::DeclineSetup => {
                tracing::info!("declining setup prompt");
                setup_false_positives = 0;
                let _ = coop.respond("2").await;
            }
            BypassAction::SetupFalsePositive => {
                setup_false_positives += 1;
                if setup_false_positives >= SETUP_FALSE_POSITIVE_LIMIT {
                    tracing::warn!("too many false-positive setup prompts, giving up");
                    return;
                }
            }
            BypassAction::Wait => {}
        }

        if sleep_or_cancel(&cancel, POLL_INTERVAL).await {
            return;
        }
    }

    tracing::warn!("startup prompt bypass timed out without a settled child");
}

/// The fixed first prompt. The exact wording is policy, not protocol —
/// it just has to point the model at the tracker.
pub fn initial_prompt(role: &str) -> String {
    format!(
        "You are online as the `{}` agent. Check the tracker for your \
         assigned work and begin. When your turn is gated, create a \
         decision record and run `roost yield`.",
        role
    )
}

/// Send the initial work prompt once the child settles at idle.
///
/// A child already `working` picked up a resumed conversation and needs
/// no nudge.
pub async fn inject_initial_prompt(coop: CoopClient, cancel: CancellationToken, role: String) {
    for _ in 0..NUDGE_ATTEMPTS {
        if cancel.is_cancelled() {
            return;
        }

        match coop.agent().await.map(|a| a.state) {
            Ok(CoopAgentState::Working) => {
                tracing::debug!("child already working, no nudge needed");
                return;
            }
            Ok(CoopAgentState::Idle) => {
                match coop.nudge(&initial_prompt(&role)).await {
                    Ok(()) => tracing::info!("initial prompt delivered"),
                    Err(e) => tracing::warn!(error = %e, "initial prompt delivery failed"),
                }
                return;
            }
            _ => {}
        }

        if sleep_or_cancel(&cancel, POLL_INTERVAL).await {
            return;
        }
    }

    tracing::warn!("child never reached idle, initial prompt not sent");
}

/// Watch for a child that exited on its own and shut its coop down so
/// the session loop can observe the exit.
pub async fn monitor_child_exit(coop: CoopClient, cancel: CancellationToken) {
    if sleep_or_cancel(&cancel, EXIT_MONITOR_INITIAL_DELAY).await {
        return;
    }

    loop {
        match coop.agent().await {
            // Coop itself is gone; nothing left to monitor.
            Err(_) => return,
            Ok(agent) if agent.state == CoopAgentState::Exited => {
                tracing::info!("child exited voluntarily, shutting down coop");
                let _ = coop.shutdown().await;
                return;
            }
            Ok(_) => {}
        }

        if sleep_or_cancel(&cancel, EXIT_MONITOR_INTERVAL).await {
            return;
        }
    }
}

#[cfg(test)]
#[path = "helpers_tests.rs"]
mod tests;
