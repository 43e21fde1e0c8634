// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Decision record creation.
//!
//! A decision is the agent's half of the yield rendezvous: a prompt
//! plus options, stamped with the requesting agent so `roost yield` can
//! find it. Every option must carry an artifact type from the allowed
//! set (or none); the tracker enforces the same rule server-side.

use super::TrackerArgs;
use crate::exit_error::ExitError;
use anyhow::Result;
use roost_core::{ArtifactType, BeadType, DecisionOption};
use roost_core::fields::FIELD_REQUESTING_AGENT;
use roost_tracker::NewBead;

#[derive(Debug, clap::Subcommand)]
pub enum DecisionCommand {
    /// Create an open decision record for this agent.
    Create {
        /// The question put to the operator.
        #[arg(long)]
        prompt: String,

        /// Option spec `id=label` or `id=label:artifact-type`; repeatable.
        #[arg(long = "option", required = true)]
        options: Vec<String>,

        #[arg(long, env = "ROOST_AGENT_BEAD")]
        agent: Option<String>,

        #[command(flatten)]
        tracker: TrackerArgs,
    },
}

/// Parse one `--option` spec. A trailing `:<artifact>` segment is an
/// artifact type only when it names one; otherwise the colon belongs to
/// the label.
pub(crate) fn parse_option(spec: &str) -> Result<DecisionOption, String> {
    let Some((id, rest)) = spec.split_once('=') else {
        return Err(format!("option `{}` must look like id=label[:artifact-type]", spec));
    };
    if id.is_empty() || rest.is_empty() {
        return Err(format!("option `{}` has an empty id or label", spec));
    }

    if let Some((label, artifact)) = rest.rsplit_once(':') {
        if let Some(artifact) = ArtifactType::parse(artifact) {
            if label.is_empty() {
                return Err(format!("option `{}` has an empty label", spec));
            }
            return Ok(DecisionOption::new(id, label).with_artifact(artifact));
        }
    }
    Ok(DecisionOption::new(id, rest))
}

pub async fn run(command: DecisionCommand) -> Result<()> {
    match command {
        DecisionCommand::Create { prompt, options, agent, tracker } => {
            create(prompt, options, agent, tracker).await
        }
    }
}

async fn create(
    prompt: String,
    option_specs: Vec<String>,
    agent: Option<String>,
    tracker: TrackerArgs,
) -> Result<()> {
    let agent = super::resolve_agent(&agent)?;
    let client = tracker.client()?;

    let mut options = Vec::with_capacity(option_specs.len());
    for spec in &option_specs {
        options.push(parse_option(spec).map_err(|e| ExitError::new(1, e))?);
    }

    let mut new = NewBead::new(BeadType::Decision, prompt);
    new.fields.set(FIELD_REQUESTING_AGENT, agent.as_str());
    new.fields.set_json(roost_core::fields::FIELD_OPTIONS, &options);

    let bead = client.create_bead(&new).await?;
    println!("{}", bead.id);
    Ok(())
}

#[cfg(test)]
#[path = "decision_tests.rs"]
mod tests;
