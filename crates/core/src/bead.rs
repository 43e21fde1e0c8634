// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The bead: a typed record in the tracker.
//!
//! Beads are the coordination unit for everything the supervisor touches —
//! the agent's own durable identity, tasks it claims, decisions it opens,
//! and the reports it delivers against them.

use crate::artifact::ArtifactType;
use crate::fields::FieldMap;
use crate::id::BeadId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Record type. The tracker is schema-light; unknown types pass through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BeadType {
    Agent,
    Task,
    Decision,
    Report,
    Config,
    Other(String),
}

impl BeadType {
    pub fn as_str(&self) -> &str {
        match self {
            BeadType::Agent => "agent",
            BeadType::Task => "task",
            BeadType::Decision => "decision",
            BeadType::Report => "report",
            BeadType::Config => "config",
            BeadType::Other(s) => s,
        }
    }
}

impl From<String> for BeadType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "agent" => BeadType::Agent,
            "task" => BeadType::Task,
            "decision" => BeadType::Decision,
            "report" => BeadType::Report,
            "config" => BeadType::Config,
            _ => BeadType::Other(s),
        }
    }
}

impl From<BeadType> for String {
    fn from(t: BeadType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for BeadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record lifecycle status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BeadStatus {
    Open,
    InProgress,
    Blocked,
    Closed,
    Other(String),
}

impl BeadStatus {
    pub fn as_str(&self) -> &str {
        match self {
            BeadStatus::Open => "open",
            BeadStatus::InProgress => "in_progress",
            BeadStatus::Blocked => "blocked",
            BeadStatus::Closed => "closed",
            BeadStatus::Other(s) => s,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, BeadStatus::Closed)
    }
}

impl From<String> for BeadStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "open" => BeadStatus::Open,
            "in_progress" => BeadStatus::InProgress,
            "blocked" => BeadStatus::Blocked,
            "closed" => BeadStatus::Closed,
            _ => BeadStatus::Other(s),
        }
    }
}

impl From<BeadStatus> for String {
    fn from(s: BeadStatus) -> Self {
        s.as_str().to_string()
    }
}

impl fmt::Display for BeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of an agent, stored on its record as `agent_state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    Spawning,
    Working,
    Idle,
    Done,
    Failed,
}

impl AgentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentState::Spawning => "spawning",
            AgentState::Working => "working",
            AgentState::Idle => "idle",
            AgentState::Done => "done",
            AgentState::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "spawning" => Some(AgentState::Spawning),
            "working" => Some(AgentState::Working),
            "idle" => Some(AgentState::Idle),
            "done" => Some(AgentState::Done),
            "failed" => Some(AgentState::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single option on a decision record.
///
/// `artifact_type` is carried as the wire string; the empty string means
/// the option requires no artifact on resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionOption {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub artifact_type: String,
}

impl DecisionOption {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self { id: id.into(), label: label.into(), artifact_type: String::new() }
    }

    pub fn with_artifact(mut self, artifact: ArtifactType) -> Self {
        self.artifact_type = artifact.as_str().to_string();
        self
    }

    /// The artifact this option requires, if any.
    pub fn artifact(&self) -> Option<ArtifactType> {
        if self.artifact_type.is_empty() {
            None
        } else {
            ArtifactType::parse(&self.artifact_type)
        }
    }

    /// An option is valid when its artifact type is empty or in the
    /// allowed set.
    pub fn is_valid(&self) -> bool {
        self.artifact_type.is_empty() || self.artifact().is_some()
    }
}

/// A typed row in the tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bead {
    pub id: BeadId,
    #[serde(rename = "type")]
    pub bead_type: BeadType,
    pub title: String,
    pub status: BeadStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<BeadId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<BeadId>,
    #[serde(default, skip_serializing_if = "FieldMap::is_empty")]
    pub fields: FieldMap,
    /// Free-form text; external systems parse `key: value` lines from it.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Bead {
    pub fn is_open(&self) -> bool {
        !self.status.is_closed()
    }
}

#[cfg(test)]
#[path = "bead_tests.rs"]
mod tests;
