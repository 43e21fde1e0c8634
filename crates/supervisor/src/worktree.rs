// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-task worktree management.
//!
//! Each claimed task gets an isolated git worktree under
//! `.beads/worktrees/<task-id>` on its own branch, so parallel tasks
//! never trample each other's working state. The worktree's branch,
//! path, and base are written back to the task record (and mirrored on
//! the agent record) so peers can base follow-up work on it. Invoked by
//! claim commands off the session critical path.

use crate::config::Config;
use crate::git::{self, GitError};
use roost_core::fields::FIELD_WORKSPACE;
use roost_core::{BeadId, WorkspaceFields};
use roost_tracker::{TrackerClient, TrackerError};
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorktreeError {
    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Tracker(#[from] TrackerError),

    #[error("worktree io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Branch name for a task: a Jira-style key in the title wins, the task
/// id otherwise.
pub(crate) fn branch_for(task_id: &BeadId, title: &str) -> String {
    static KEY_PATTERN: OnceLock<regex::Regex> = OnceLock::new();
    let pattern = KEY_PATTERN.get_or_init(|| {
        // Literal pattern, cannot fail to compile.
        #[allow(clippy::unwrap_used)]
        let pattern = regex::Regex::new(r"[A-Z]+-[0-9]+").unwrap();
        pattern
    });
    match pattern.find(title) {
        Some(key) => format!("fix/{}", key.as_str()),
        None => format!("fix/{}", task_id),
    }
}

fn worktree_path(cfg: &Config, task_id: &BeadId) -> PathBuf {
    cfg.worktrees_dir().join(task_id.as_str())
}

/// Create the task's worktree and record it on the tracker.
pub async fn setup(
    cfg: &Config,
    tracker: &TrackerClient,
    task_id: &BeadId,
) -> Result<WorkspaceFields, WorktreeError> {
    let task = tracker.get_bead(task_id).await?;
    let path = worktree_path(cfg, task_id);

    // Re-running a claim is a no-op once the worktree exists.
    if let Some(existing) = task.fields.workspace() {
        if path.is_dir() {
            tracing::info!(task = %task_id, branch = %existing.branch, "worktree already exists");
            return Ok(existing);
        }
    }

    let branch = branch_for(task_id, &task.title);
    let base = resolve_base_branch(cfg, tracker, &task.dependencies).await;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    git::git(
        &cfg.workspace,
        &["worktree", "add", "-b", &branch, &path.display().to_string(), &base],
    )
    .await?;
    tracing::info!(task = %task_id, %branch, %base, path = %path.display(), "worktree created");

    let workspace = WorkspaceFields {
        branch,
        path: path.display().to_string(),
        base_branch: base,
    };

    let mut patch = roost_core::FieldMap::new();
    patch.set_json(FIELD_WORKSPACE, &workspace);
    tracker.update_fields(task_id, &patch).await?;

    if let Some(agent) = cfg.agent_bead.clone() {
        let mut patch = roost_core::FieldMap::new();
        patch.set_json(format!("{}.{}", FIELD_WORKSPACE, task_id), &workspace);
        if let Err(e) = tracker.update_fields(&agent, &patch).await {
            tracing::warn!(error = %e, "could not mirror workspace onto agent record");
        }
    }

    Ok(workspace)
}

/// The base branch: first dependency that already has a workspace
/// sub-record, otherwise the default remote branch.
async fn resolve_base_branch(
    cfg: &Config,
    tracker: &TrackerClient,
    dependencies: &[BeadId],
) -> String {
    for dep in dependencies {
        match tracker.get_bead(dep).await {
            Ok(bead) => {
                if let Some(workspace) = bead.fields.workspace() {
                    return workspace.branch;
                }
            }
            Err(e) => tracing::warn!(dep = %dep, error = %e, "could not read dependency"),
        }
    }
    git::default_branch(&cfg.workspace).await
}

/// Remove the task's worktree and clear the tracker fields.
pub async fn teardown(
    cfg: &Config,
    tracker: &TrackerClient,
    task_id: &BeadId,
) -> Result<(), WorktreeError> {
    let path = worktree_path(cfg, task_id);

    let removed = git::git(
        &cfg.workspace,
        &["worktree", "remove", "--force", &path.display().to_string()],
    )
    .await;
    if let Err(e) = removed {
        tracing::warn!(task = %task_id, error = %e, "git worktree remove failed, deleting directory");
        if path.exists() {
            std::fs::remove_dir_all(&path)?;
        }
        let _ = git::git_unchecked(&cfg.workspace, &["worktree", "prune"]).await;
    }

    tracker.edit_fields(task_id, |fields| {
        fields.remove(FIELD_WORKSPACE);
    })
    .await?;

    if let Some(agent) = cfg.agent_bead.clone() {
        let key = format!("{}.{}", FIELD_WORKSPACE, task_id);
        if let Err(e) = tracker.edit_fields(&agent, |fields| {
            fields.remove(&key);
        })
        .await
        {
            tracing::warn!(error = %e, "could not clear workspace mirror on agent record");
        }
    }

    tracing::info!(task = %task_id, "worktree removed");
    Ok(())
}

/// One row of the worktree audit.
#[derive(Debug)]
pub struct AuditEntry {
    pub task_id: String,
    pub path: PathBuf,
    pub dirty: bool,
}

/// List all worktrees and whether each has uncommitted changes.
/// Non-blocking by contract: callers report and exit zero regardless.
pub async fn audit(cfg: &Config) -> Vec<AuditEntry> {
    let Ok(entries) = std::fs::read_dir(cfg.worktrees_dir()) else {
        return Vec::new();
    };

    let mut report = Vec::new();
    for entry in entries.filter_map(Result::ok) {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let dirty = git::is_dirty(&path).await;
        report.push(AuditEntry {
            task_id: entry.file_name().to_string_lossy().into_owned(),
            path,
            dirty,
        });
    }
    report.sort_by(|a, b| a.task_id.cmp(&b.task_id));
    report
}

#[cfg(test)]
#[path = "worktree_tests.rs"]
mod tests;
