// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Model-tool settings and workspace instructions.
//!
//! The settings document grants the fixed permission set the runtime
//! needs, auto-enables language-server plugins found on PATH, and
//! carries the materialized hook wiring. The instruction file gets a
//! marker-guarded role section appended exactly once.

use serde_json::{json, Value};
use std::path::{Path, PathBuf};

/// Tools the agent is always allowed to use.
const PERMISSION_ALLOW: [&str; 6] = ["Bash", "Edit", "Write", "Read", "Glob", "Grep"];

/// Language servers probed on PATH; each found binary enables the
/// matching plugin.
const LSP_SERVERS: [(&str, &str); 4] = [
    ("rust-analyzer", "rust"),
    ("gopls", "go"),
    ("typescript-language-server", "typescript"),
    ("pyright", "python"),
];

/// Marker guarding the append-once role section in the instruction file.
const ROLE_MARKER: &str = "<!-- roost:role -->";

pub fn settings_path(workspace: &Path) -> PathBuf {
    workspace.join(".claude").join("settings.json")
}

pub fn instructions_path(workspace: &Path) -> PathBuf {
    workspace.join("CLAUDE.md")
}

/// Write the settings document. Deterministic content, so re-runs are
/// byte-identical.
pub fn write_settings(workspace: &Path, hooks: &Value) -> Result<(), std::io::Error> {
    let lsp: serde_json::Map<String, Value> = detect_lsp_servers()
        .into_iter()
        .map(|lang| (lang.to_string(), Value::Bool(true)))
        .collect();

    let settings = json!({
        "permissions": { "allow": PERMISSION_ALLOW },
        "lsp": lsp,
        "hooks": hooks,
    });

    let path = settings_path(workspace);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let rendered = format!("{:#}\n", settings);
    crate::workspace::write_if_changed(&path, rendered.as_bytes())
}

/// Languages whose LSP server is installed on this image.
pub fn detect_lsp_servers() -> Vec<&'static str> {
    LSP_SERVERS
        .iter()
        .filter(|(binary, _)| on_path(binary))
        .map(|(_, lang)| *lang)
        .collect()
}

fn on_path(binary: &str) -> bool {
    let Some(path) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&path).any(|dir| {
        let candidate = dir.join(binary);
        candidate.is_file()
    })
}

/// Append the role-specific section to the workspace instruction file,
/// once. The marker makes re-runs no-ops.
pub fn append_role_instructions(workspace: &Path, role: &str) -> Result<(), std::io::Error> {
    let path = instructions_path(workspace);
    let existing = std::fs::read_to_string(&path).unwrap_or_default();
    if existing.contains(ROLE_MARKER) {
        return Ok(());
    }

    let section = format!(
        "\n{marker}\n## Runtime\n\n\
         You are running as a `{role}` agent under a roost supervisor. \
         Coordination state lives in the beads tracker (`.beads/config.json`). \
         When your turn is gated, create a decision record and run `roost yield` \
         to wait for the operator.\n",
        marker = ROLE_MARKER,
        role = role,
    );
    std::fs::write(&path, existing + &section)
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
