// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Artifact types deliverable against a resolved decision.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed set of artifact kinds a decision option may require.
///
/// The tracker rejects decision options carrying anything outside this set,
/// and the CLI validates before sending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactType {
    Report,
    Plan,
    Checklist,
    DiffSummary,
    Epic,
    Bug,
}

impl ArtifactType {
    pub const ALL: [ArtifactType; 6] = [
        ArtifactType::Report,
        ArtifactType::Plan,
        ArtifactType::Checklist,
        ArtifactType::DiffSummary,
        ArtifactType::Epic,
        ArtifactType::Bug,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactType::Report => "report",
            ArtifactType::Plan => "plan",
            ArtifactType::Checklist => "checklist",
            ArtifactType::DiffSummary => "diff-summary",
            ArtifactType::Epic => "epic",
            ArtifactType::Bug => "bug",
        }
    }

    /// Parse an artifact type; empty input means "no artifact required".
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == s)
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery state of a required artifact, stamped on the decision record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactStatus {
    Pending,
    Delivered,
}

impl ArtifactStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactStatus::Pending => "pending",
            ArtifactStatus::Delivered => "delivered",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ArtifactStatus::Pending),
            "delivered" => Some(ArtifactStatus::Delivered),
            _ => None,
        }
    }
}

impl fmt::Display for ArtifactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[path = "artifact_tests.rs"]
mod tests;
