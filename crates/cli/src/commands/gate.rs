// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operator-only gate control.
//!
//! The only legitimate gate transitions are the yield protocol and this
//! operator force; the force path stamps `gate_satisfied_by: operator`
//! so the distinction is auditable (and enforceable server-side).

use super::TrackerArgs;
use crate::exit_error::ExitError;
use anyhow::Result;
use roost_core::fields::FIELD_GATE_SATISFIED_BY;
use roost_core::{FieldMap, GateSatisfiedBy, DECISION_GATE};

#[derive(Debug, clap::Subcommand)]
pub enum GateCommand {
    /// Force the decision gate to satisfied (operator only).
    Satisfy {
        #[arg(long, env = "ROOST_AGENT_BEAD")]
        agent: Option<String>,

        /// Acknowledge this is an operator override, not the agent
        /// releasing its own gate.
        #[arg(long)]
        operator: bool,

        #[command(flatten)]
        tracker: TrackerArgs,
    },
    /// Reset the decision gate to pending.
    Clear {
        #[arg(long, env = "ROOST_AGENT_BEAD")]
        agent: Option<String>,

        #[command(flatten)]
        tracker: TrackerArgs,
    },
}

pub async fn run(command: GateCommand) -> Result<()> {
    match command {
        GateCommand::Satisfy { agent, operator, tracker } => {
            if !operator {
                return Err(ExitError::new(
                    1,
                    "gate satisfy is operator-only; pass --operator to confirm \
                     (agents release the gate via `roost yield`)",
                )
                .into());
            }
            let agent = super::resolve_agent(&agent)?;
            let client = tracker.client()?;

            let mut patch = FieldMap::new();
            patch.set(FIELD_GATE_SATISFIED_BY, GateSatisfiedBy::Operator.as_str());
            client.update_fields(&agent, &patch).await?;
            client.satisfy_gate(&agent, DECISION_GATE).await?;
            println!("gate satisfied for {}", agent);
            Ok(())
        }
        GateCommand::Clear { agent, tracker } => {
            let agent = super::resolve_agent(&agent)?;
            let client = tracker.client()?;
            client.clear_gate(&agent, DECISION_GATE).await?;
            println!("gate cleared for {}", agent);
            Ok(())
        }
    }
}
