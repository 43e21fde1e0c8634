// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::coop::CoopPrompt;

fn agent(state: CoopAgentState) -> CoopAgent {
    CoopAgent { state, prompt: None }
}

fn agent_with_prompt(state: CoopAgentState, prompt_type: &str) -> CoopAgent {
    CoopAgent {
        state,
        prompt: Some(CoopPrompt { prompt_type: prompt_type.to_string() }),
    }
}

#[yare::parameterized(
    idle    = { CoopAgentState::Idle },
    working = { CoopAgentState::Working },
)]
fn settled_states_finish_bypass(state: CoopAgentState) {
    assert_eq!(bypass_action(&agent(state), ""), BypassAction::Done);
}

#[test]
fn resume_picker_is_dismissed() {
    let action = bypass_action(
        &agent(CoopAgentState::Starting),
        "┌ Resume Session ┐\n> latest conversation",
    );
    assert_eq!(action, BypassAction::DismissResumePicker);
}

#[test]
fn custom_api_key_is_accepted() {
    let action = bypass_action(
        &agent(CoopAgentState::Starting),
        "Detected a custom API key in your environment",
    );
    assert_eq!(action, BypassAction::AcceptApiKey);
}

#[test]
fn setup_prompt_with_exit_text_is_declined() {
    let action = bypass_action(
        &agent_with_prompt(CoopAgentState::Starting, "setup"),
        "1. Yes, continue\n2. No, exit",
    );
    assert_eq!(action, BypassAction::DeclineSetup);
}

#[test]
fn setup_prompt_without_exit_text_is_false_positive() {
    let action = bypass_action(
        &agent_with_prompt(CoopAgentState::Starting, "setup"),
        "something unrelated",
    );
    assert_eq!(action, BypassAction::SetupFalsePositive);
}

#[test]
fn unrecognized_screen_waits() {
    assert_eq!(
        bypass_action(&agent(CoopAgentState::Starting), "booting..."),
        BypassAction::Wait
    );
    assert_eq!(
        bypass_action(&agent(CoopAgentState::Other("odd".into())), ""),
        BypassAction::Wait
    );
}

#[test]
fn non_setup_prompt_types_wait() {
    let action = bypass_action(
        &agent_with_prompt(CoopAgentState::Other("prompting".into()), "permission"),
        "Allow this tool?",
    );
    assert_eq!(action, BypassAction::Wait);
}

#[test]
fn initial_prompt_mentions_role_and_yield() {
    let prompt = initial_prompt("reviewer");
    assert!(prompt.contains("`reviewer`"));
    assert!(prompt.contains("roost yield"));
}

#[tokio::test]
async fn sleep_or_cancel_returns_immediately_on_cancel() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let start = std::time::Instant::now();
    assert!(sleep_or_cancel(&cancel, Duration::from_secs(60)).await);
    assert!(start.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn cancelled_helpers_return_promptly() {
    let coop = CoopClient::new(1, 1).unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let start = std::time::Instant::now();
    startup_prompt_bypass(coop.clone(), cancel.clone()).await;
    inject_initial_prompt(coop.clone(), cancel.clone(), "worker".into()).await;
    monitor_child_exit(coop, cancel).await;
    assert!(start.elapsed() < Duration::from_secs(3));
}
