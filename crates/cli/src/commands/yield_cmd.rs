// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `roost yield` — wait for the operator to resolve this agent's open
//! decision, then release the decision gate.
//!
//! The gate is released only here (or by an operator force); both paths
//! stamp `gate_satisfied_by` so a tracker-side evaluator can treat any
//! other transition as still-pending. When the chosen option requires
//! an artifact the gate stays pending and the caller is told what it
//! owes — `roost artifact report` completes the exchange.

use super::TrackerArgs;
use crate::exit_error::ExitError;
use anyhow::Result;
use roost_core::fields::FIELD_GATE_SATISFIED_BY;
use roost_core::{Bead, BeadId, BeadStatus, BeadType, FieldMap, GateSatisfiedBy, DECISION_GATE};
use roost_tracker::{BeadQuery, RecordEventKind, TrackerClient};
use std::time::Duration;

/// Poll cadence when the event stream is unavailable.
const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Topic covering all record events.
const RECORDS_TOPIC: &str = "records.>";

#[derive(Debug, clap::Args)]
pub struct YieldArgs {
    #[arg(long, env = "ROOST_AGENT_BEAD")]
    agent: Option<String>,

    /// Give up after this long (the pod's restart loop will try again).
    #[arg(long, default_value_t = 24 * 60 * 60)]
    timeout_secs: u64,

    #[command(flatten)]
    tracker: TrackerArgs,
}

/// How a yield concluded.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum YieldOutcome {
    /// Gate satisfied; the turn may end.
    Satisfied { chosen: Option<String>, response: Option<String>, responded_by: Option<String> },
    /// Resolution requires an artifact first; gate left pending.
    ArtifactRequired { artifact: String, decision: BeadId },
    /// Timeout or cancellation; nothing changed.
    TimedOut,
}

pub async fn run(args: YieldArgs) -> Result<()> {
    let agent = super::resolve_agent(&args.agent)?;
    let client = args.tracker.client()?;

    let outcome =
        wait_for_resolution(&client, &agent, Duration::from_secs(args.timeout_secs)).await?;

    match outcome {
        YieldOutcome::Satisfied { chosen, response, responded_by } => {
            println!(
                "decision resolved: chosen={} by={}",
                chosen.as_deref().unwrap_or("-"),
                responded_by.as_deref().unwrap_or("-"),
            );
            if let Some(response) = response {
                println!("{}", response);
            }
        }
        YieldOutcome::ArtifactRequired { artifact, decision } => {
            println!("artifact required {} for {}", artifact, decision);
        }
        YieldOutcome::TimedOut => {
            tracing::warn!("yield timed out waiting for resolution");
        }
    }
    Ok(())
}

/// The yield algorithm: find the open decision, wait for it to close
/// (SSE first, 2s polling as fallback), then either satisfy the gate or
/// report the owed artifact.
pub(crate) async fn wait_for_resolution(
    client: &TrackerClient,
    agent: &BeadId,
    timeout: Duration,
) -> Result<YieldOutcome> {
    let query = BeadQuery::new()
        .bead_type(BeadType::Decision)
        .status(BeadStatus::Open)
        .field(roost_core::fields::FIELD_REQUESTING_AGENT, agent.as_str())
        .sort("-created_at");
    let open = client.list_beads(&query).await?;
    let Some(pending) = open.into_iter().next() else {
        return Err(ExitError::new(1, "no open decision for this agent").into());
    };
    tracing::info!(decision = %pending.id, "waiting for resolution");

    let deadline = tokio::time::Instant::now() + timeout;
    let mut events = match client.events(RECORDS_TOPIC).await {
        Ok(stream) => Some(stream),
        Err(e) => {
            tracing::debug!(error = %e, "event stream unavailable, polling");
            None
        }
    };

    loop {
        // The resolution may have landed before we subscribed, or
        // between events.
        let current = client.get_bead(&pending.id).await?;
        if !current.is_open() {
            return finish(client, agent, current).await;
        }

        let closed = match events.as_mut() {
            Some(stream) => {
                tokio::select! {
                    event = stream.next() => match event {
                        Some(Ok(event)) => {
                            event.bead_id == pending.id
                                && event.kind == RecordEventKind::Closed
                        }
                        // Stream gone: drop to polling from here on.
                        Some(Err(_)) | None => {
                            events = None;
                            false
                        }
                    },
                    _ = tokio::time::sleep_until(deadline) => return Ok(YieldOutcome::TimedOut),
                }
            }
            None => {
                tokio::select! {
                    _ = tokio::time::sleep(POLL_INTERVAL) => false,
                    _ = tokio::time::sleep_until(deadline) => return Ok(YieldOutcome::TimedOut),
                }
            }
        };

        if closed {
            let resolved = client.get_bead(&pending.id).await?;
            return finish(client, agent, resolved).await;
        }
    }
}

/// Handle a closed decision: artifact owed, or satisfy the gate.
async fn finish(
    client: &TrackerClient,
    agent: &BeadId,
    decision: Bead,
) -> Result<YieldOutcome> {
    if let Some(artifact) = decision.fields.required_artifact() {
        // Gate stays pending until the artifact is delivered and its
        // report record closed.
        return Ok(YieldOutcome::ArtifactRequired {
            artifact: artifact.to_string(),
            decision: decision.id,
        });
    }

    satisfy_gate(client, agent).await?;

    Ok(YieldOutcome::Satisfied {
        chosen: decision.fields.chosen().map(String::from),
        response: decision
            .fields
            .get_nonempty(roost_core::fields::FIELD_RESPONSE_TEXT)
            .map(String::from),
        responded_by: decision
            .fields
            .get_nonempty(roost_core::fields::FIELD_RESPONDED_BY)
            .map(String::from),
    })
}

/// Stamp the satisfier tag, then release the gate.
pub(crate) async fn satisfy_gate(client: &TrackerClient, agent: &BeadId) -> Result<()> {
    let mut patch = FieldMap::new();
    patch.set(FIELD_GATE_SATISFIED_BY, GateSatisfiedBy::Yield.as_str());
    client.update_fields(agent, &patch).await?;
    client.satisfy_gate(agent, DECISION_GATE).await?;
    Ok(())
}

#[cfg(test)]
#[path = "yield_tests.rs"]
mod tests;
