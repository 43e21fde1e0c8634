// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dynamic record fields.
//!
//! The tracker returns record fields as a JSON object whose values may be
//! strings, numbers, arrays, or nested objects. Internally every value is
//! held as its JSON text form under a string key; typed accessors cover
//! the fields the supervisor knows about, and raw access covers the rest.
//!
//! The tracker replaces the full fields object on update, so callers
//! mutate a copy obtained from a fresh read and send the whole map back
//! (read-modify-write).

use crate::artifact::{ArtifactStatus, ArtifactType};
use crate::bead::{AgentState, DecisionOption};
use crate::gate::GateSatisfiedBy;
use crate::id::BeadId;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// Field keys the supervisor reads or writes.
pub const FIELD_AGENT_STATE: &str = "agent_state";
pub const FIELD_STOP_REQUESTED: &str = "stop_requested";
pub const FIELD_GATE_SATISFIED_BY: &str = "gate_satisfied_by";
pub const FIELD_REQUESTING_AGENT: &str = "requesting_agent_bead_id";
pub const FIELD_WORKSPACE: &str = "workspace";
pub const FIELD_OPTIONS: &str = "options";
pub const FIELD_CHOSEN: &str = "chosen";
pub const FIELD_RESPONSE_TEXT: &str = "response_text";
pub const FIELD_RESPONDED_BY: &str = "responded_by";
pub const FIELD_RESPONDED_AT: &str = "responded_at";
pub const FIELD_REQUIRED_ARTIFACT: &str = "required_artifact";
pub const FIELD_ARTIFACT_STATUS: &str = "artifact_status";

/// Workspace sub-record written to a task when its worktree is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceFields {
    pub branch: String,
    pub path: String,
    pub base_branch: String,
}

/// String-keyed field map; non-string values live as their JSON text form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap(BTreeMap<String, String>);

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Raw text of a field, as stored.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// A field that is non-empty text.
    pub fn get_nonempty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Store a value by its JSON text form.
    pub fn set_json<T: Serialize>(&mut self, key: impl Into<String>, value: &T) {
        let text = serde_json::to_string(value).unwrap_or_default();
        self.0.insert(key.into(), text);
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    /// Overlay `patch` onto this map (later wins per key).
    pub fn merge(&mut self, patch: &FieldMap) {
        for (k, v) in &patch.0 {
            self.0.insert(k.clone(), v.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    // ---- Typed accessors ----

    pub fn agent_state(&self) -> Option<AgentState> {
        self.get(FIELD_AGENT_STATE).and_then(AgentState::parse)
    }

    /// `stop_requested` is stored as bool-as-string.
    pub fn stop_requested(&self) -> bool {
        self.get(FIELD_STOP_REQUESTED) == Some("true")
    }

    pub fn gate_satisfied_by(&self) -> Option<GateSatisfiedBy> {
        self.get_nonempty(FIELD_GATE_SATISFIED_BY).and_then(GateSatisfiedBy::parse)
    }

    pub fn requesting_agent(&self) -> Option<BeadId> {
        self.get_nonempty(FIELD_REQUESTING_AGENT).map(BeadId::from)
    }

    pub fn workspace(&self) -> Option<WorkspaceFields> {
        self.get(FIELD_WORKSPACE).and_then(|text| serde_json::from_str(text).ok())
    }

    /// Workspace sub-record for one claimed task on an agent record.
    pub fn task_workspace(&self, task: &BeadId) -> Option<WorkspaceFields> {
        self.get(&format!("{}.{}", FIELD_WORKSPACE, task))
            .and_then(|text| serde_json::from_str(text).ok())
    }

    pub fn options(&self) -> Vec<DecisionOption> {
        self.get(FIELD_OPTIONS)
            .and_then(|text| serde_json::from_str(text).ok())
            .unwrap_or_default()
    }

    pub fn chosen(&self) -> Option<&str> {
        self.get_nonempty(FIELD_CHOSEN)
    }

    pub fn required_artifact(&self) -> Option<ArtifactType> {
        self.get_nonempty(FIELD_REQUIRED_ARTIFACT).and_then(ArtifactType::parse)
    }

    pub fn artifact_status(&self) -> Option<ArtifactStatus> {
        self.get_nonempty(FIELD_ARTIFACT_STATUS).and_then(ArtifactStatus::parse)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Deserialize from an arbitrary JSON object: string values are kept
/// verbatim, everything else is re-serialized to its JSON text form.
impl<'de> Deserialize<'de> for FieldMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldMapVisitor;

        impl<'de> Visitor<'de> for FieldMapVisitor {
            type Value = FieldMap;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a JSON object of record fields")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<FieldMap, A::Error> {
                let mut map = BTreeMap::new();
                while let Some((key, value)) =
                    access.next_entry::<String, serde_json::Value>()?
                {
                    let text = match value {
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    };
                    map.insert(key, text);
                }
                Ok(FieldMap(map))
            }
        }

        deserializer.deserialize_map(FieldMapVisitor)
    }
}

/// Serialize back to a JSON object. A stored value that round-trips
/// through JSON (parses, and re-serializes to the identical text) was
/// ingested from a non-string value and is emitted in its original form;
/// anything else is emitted as a string.
impl Serialize for FieldMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, text) in &self.0 {
            match serde_json::from_str::<serde_json::Value>(text) {
                Ok(value) if !value.is_string() && value.to_string() == *text => {
                    map.serialize_entry(key, &value)?;
                }
                _ => {
                    map.serialize_entry(key, text)?;
                }
            }
        }
        map.end()
    }
}

#[cfg(test)]
#[path = "fields_tests.rs"]
mod tests;
