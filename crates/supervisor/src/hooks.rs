// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hook configuration materialization.
//!
//! Hook wiring lives in the tracker as config records so operators can
//! change it fleet-wide without rebuilding images: `hooks:global` applies
//! to every agent, `hooks:<role>` overlays per role (later wins by hook
//! type). When the tracker has neither, a built-in set keeps the
//! stop-gate protocol working.

use roost_core::{BeadStatus, BeadType};
use roost_tracker::{BeadQuery, TrackerClient};
use serde_json::{json, Value};

/// Hook types the default set must cover.
const DEFAULT_HOOK_TYPES: [&str; 5] =
    ["SessionStart", "Stop", "PreToolUse", "PostToolUse", "PreCompact"];

/// Field on a `config` bead holding the hooks object.
const FIELD_HOOKS: &str = "hooks";

/// Resolve the hooks object for this role: tracker config when present,
/// built-in defaults otherwise.
pub async fn materialize(tracker: Option<&TrackerClient>, role: &str) -> Value {
    let mut merged = Value::Object(serde_json::Map::new());
    let mut found_any = false;

    if let Some(tracker) = tracker {
        for label in ["hooks:global".to_string(), format!("hooks:{}", role)] {
            match fetch_hook_config(tracker, &label).await {
                Some(overlay) => {
                    merge_hooks(&mut merged, overlay);
                    found_any = true;
                }
                None => {
                    tracing::debug!(%label, "no hook config record");
                }
            }
        }
    }

    if !found_any {
        tracing::info!("no hook config in tracker, using built-in defaults");
        return default_hooks();
    }
    merged
}

async fn fetch_hook_config(tracker: &TrackerClient, label: &str) -> Option<Value> {
    let query = BeadQuery::new()
        .bead_type(BeadType::Config)
        .status(BeadStatus::Open)
        .label(label);
    let beads = match tracker.list_beads(&query).await {
        Ok(beads) => beads,
        Err(e) => {
            tracing::warn!(%label, error = %e, "hook config fetch failed");
            return None;
        }
    };
    let bead = beads.first()?;
    let text = bead.fields.get(FIELD_HOOKS)?;
    serde_json::from_str(text).ok()
}

/// Overlay hook entries onto `base`, later wins per hook-type key.
fn merge_hooks(base: &mut Value, overlay: Value) {
    if let (Value::Object(base), Value::Object(overlay)) = (base, overlay) {
        for (key, value) in overlay {
            base.insert(key, value);
        }
    }
}

/// The built-in hook set: every lifecycle event forwards to
/// `roost hook emit`, which lets the tracker's gate evaluation answer.
pub fn default_hooks() -> Value {
    let mut hooks = serde_json::Map::new();
    for hook_type in DEFAULT_HOOK_TYPES {
        hooks.insert(
            hook_type.to_string(),
            json!([{
                "matcher": "",
                "hooks": [{
                    "type": "command",
                    "command": format!("roost hook emit {}", hook_type),
                }],
            }]),
        );
    }
    Value::Object(hooks)
}

#[cfg(test)]
#[path = "hooks_tests.rs"]
mod tests;
