// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Artifact delivery against a resolved decision.
//!
//! Creates a report record with the content, links it parent-child to
//! the decision, closes it, stamps the decision delivered — and then
//! releases the decision gate, completing the yield exchange that was
//! left pending for the artifact.

use super::TrackerArgs;
use crate::exit_error::ExitError;
use anyhow::{Context, Result};
use roost_core::fields::{FIELD_ARTIFACT_STATUS, FIELD_REQUIRED_ARTIFACT};
use roost_core::{ArtifactStatus, ArtifactType, BeadId, BeadType, FieldMap};
use roost_tracker::NewBead;
use std::io::Read;
use std::path::PathBuf;

#[derive(Debug, clap::Subcommand)]
pub enum ArtifactCommand {
    /// Deliver the artifact a resolved decision requires.
    Report {
        /// The decision record owed an artifact.
        decision: String,

        /// Artifact type; must match what the decision requires.
        #[arg(long = "type")]
        artifact_type: String,

        /// Inline content. Reads stdin when neither this nor --file is given.
        #[arg(long, conflicts_with = "file")]
        content: Option<String>,

        /// Read content from a file.
        #[arg(long)]
        file: Option<PathBuf>,

        #[command(flatten)]
        tracker: TrackerArgs,
    },
}

pub async fn run(command: ArtifactCommand) -> Result<()> {
    match command {
        ArtifactCommand::Report { decision, artifact_type, content, file, tracker } => {
            report(decision, artifact_type, content, file, tracker).await
        }
    }
}

async fn report(
    decision_id: String,
    artifact_type: String,
    content: Option<String>,
    file: Option<PathBuf>,
    tracker: TrackerArgs,
) -> Result<()> {
    let artifact = ArtifactType::parse(&artifact_type).ok_or_else(|| {
        ExitError::new(1, format!("unknown artifact type `{}`", artifact_type))
    })?;
    let decision_id = BeadId::new(decision_id);
    let client = tracker.client()?;

    let decision = client.get_bead(&decision_id).await?;
    let required = decision.fields.required_artifact();
    if required != Some(artifact) {
        return Err(ExitError::new(
            1,
            match required {
                Some(required) => {
                    format!("decision {} requires a {} artifact", decision_id, required)
                }
                None => format!("decision {} does not require an artifact", decision_id),
            },
        )
        .into());
    }

    let content = read_content(content, file)?;

    // Create, link, close: reports are delivered whole.
    let mut new = NewBead::new(
        BeadType::Report,
        format!("{} for {}", artifact, decision_id),
    );
    new.parent = Some(decision_id.clone());
    new.fields.set("content", content);
    new.fields.set(FIELD_REQUIRED_ARTIFACT, artifact.as_str());
    let report = client.create_bead(&new).await?;
    client.close_bead(&report.id, &FieldMap::new()).await?;

    let mut stamp = FieldMap::new();
    stamp.set(FIELD_ARTIFACT_STATUS, ArtifactStatus::Delivered.as_str());
    client.update_fields(&decision_id, &stamp).await?;

    // The artifact clears the agent's debt; release the gate.
    if let Some(agent) = decision.fields.requesting_agent() {
        super::yield_cmd::satisfy_gate(&client, &agent).await?;
    } else {
        tracing::warn!(decision = %decision_id, "decision has no requesting agent, gate untouched");
    }

    println!("{}", report.id);
    Ok(())
}

fn read_content(content: Option<String>, file: Option<PathBuf>) -> Result<String> {
    if let Some(content) = content {
        return Ok(content);
    }
    if let Some(file) = file {
        return std::fs::read_to_string(&file)
            .with_context(|| format!("reading {}", file.display()));
    }
    let mut stdin = String::new();
    std::io::stdin()
        .read_to_string(&mut stdin)
        .context("reading artifact content from stdin")?;
    Ok(stdin)
}

#[cfg(test)]
#[path = "artifact_tests.rs"]
mod tests;
