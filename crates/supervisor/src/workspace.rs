// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace provisioning — one-time setup that must also be safe to
//! re-run on every pod restart.
//!
//! Every step is idempotent: running `setup` twice leaves git state,
//! tool settings, and the tracker config byte-identical. The stale-branch
//! reset never runs while any per-task worktree exists.

use crate::config::Config;
use crate::git::{self, GitError};
use crate::{env, hooks, settings};
use roost_tracker::TrackerClient;
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("workspace io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error("failed to write settings: {0}")]
    Settings(#[from] serde_json::Error),
}

/// Environment the provisioner computed for the coop child.
#[derive(Debug, Default)]
pub struct ProvisionOutcome {
    pub extra_env: Vec<(String, String)>,
}

/// Make the workspace usable before the first session.
pub async fn setup(
    cfg: &Config,
    tracker: Option<&TrackerClient>,
) -> Result<ProvisionOutcome, WorkspaceError> {
    let mut outcome = ProvisionOutcome::default();

    // 1. Platform version, exported to the child when present.
    if let Ok(version) = std::fs::read_to_string(env::platform_version_file()) {
        let version = version.trim().to_string();
        if !version.is_empty() {
            tracing::info!(%version, "platform version");
            outcome.extra_env.push(("ROOST_PLATFORM_VERSION".to_string(), version));
        }
    }

    // 2. Git identity and credentials. Best-effort: a failure here means
    //    pushes will fail later, which is recoverable.
    if let Err(e) = configure_git(cfg).await {
        tracing::warn!(error = %e, "git identity setup failed");
    }

    // 3. Make sure the workspace is a repo.
    tokio::fs::create_dir_all(&cfg.workspace).await?;
    if !git::is_repo(&cfg.workspace).await {
        git::git(&cfg.workspace, &["init"]).await?;
        tracing::info!(workspace = %cfg.workspace.display(), "initialized git repository");
    }

    // 4. Stale-branch reset, gated on zero worktrees.
    reset_stale_branch(cfg).await?;

    // 5. Tracker client config for tools running inside the workspace.
    write_tracker_config(cfg)?;

    // Persistent-volume layout + home-dir redirect.
    provision_state_dirs(cfg, &mut outcome)?;

    // Model-tool settings, role instructions, hook wiring.
    let hook_config = hooks::materialize(tracker, &cfg.role).await;
    settings::write_settings(&cfg.workspace, &hook_config)?;
    settings::append_role_instructions(&cfg.workspace, &cfg.role)?;

    Ok(outcome)
}

/// Write git global identity and a store-helper credential for the
/// provider, from env-provided values.
async fn configure_git(cfg: &Config) -> Result<(), WorkspaceError> {
    if !cfg.git_user_name.is_empty() {
        git::git(&cfg.workspace, &["config", "--global", "user.name", &cfg.git_user_name]).await?;
    }
    if !cfg.git_user_email.is_empty() {
        git::git(&cfg.workspace, &["config", "--global", "user.email", &cfg.git_user_email])
            .await?;
    }
    if !cfg.git_token.is_empty() {
        let Some(home) = dirs::home_dir() else {
            return Ok(());
        };
        let credentials = format!("https://x-access-token:{}@github.com\n", cfg.git_token);
        let path = home.join(".git-credentials");
        std::fs::write(&path, credentials)?;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))?;
        git::git(&cfg.workspace, &["config", "--global", "credential.helper", "store"]).await?;
    }
    Ok(())
}

/// Put the primary workspace back on the default branch — but only when
/// no per-task worktrees exist (their branches are checked out from
/// this repo and a reset underneath them corrupts state).
async fn reset_stale_branch(cfg: &Config) -> Result<(), WorkspaceError> {
    let worktrees = count_worktrees(&cfg.worktrees_dir());
    let default = git::default_branch(&cfg.workspace).await;
    let current = git::current_branch(&cfg.workspace).await;

    let Some(current) = current else {
        return Ok(());
    };
    if current == default {
        return Ok(());
    }
    if worktrees > 0 {
        tracing::info!(
            branch = %current,
            worktrees,
            "workspace on non-default branch but worktrees exist, skipping reset"
        );
        return Ok(());
    }

    tracing::info!(from = %current, to = %default, "resetting workspace to default branch");
    git::git(&cfg.workspace, &["reset", "--hard"]).await?;
    git::git(&cfg.workspace, &["clean", "-fd"]).await?;
    if git::git_unchecked(&cfg.workspace, &["checkout", &default])
        .await
        .map(|o| !o.status.success())
        .unwrap_or(true)
    {
        git::git(&cfg.workspace, &["checkout", "-b", &default]).await?;
    }
    Ok(())
}

fn count_worktrees(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| entries.filter_map(Result::ok).filter(|e| e.path().is_dir()).count())
        .unwrap_or(0)
}

fn write_tracker_config(cfg: &Config) -> Result<(), WorkspaceError> {
    std::fs::create_dir_all(cfg.beads_dir())?;
    let config = serde_json::json!({
        "url": cfg.tracker_url,
        "token": cfg.tracker_token,
    });
    let rendered = format!("{:#}\n", config);
    write_if_changed(&cfg.tracker_config_path(), rendered.as_bytes())?;
    Ok(())
}

/// Create `.state/<tool>` directories and point the tool's home path at
/// them so state survives pod restarts.
fn provision_state_dirs(cfg: &Config, outcome: &mut ProvisionOutcome) -> Result<(), WorkspaceError> {
    std::fs::create_dir_all(cfg.sessions_dir())?;

    if let Some(home) = dirs::home_dir() {
        redirect_home_path(&home.join(".claude"), &cfg.claude_state_dir())?;
    }

    outcome
        .extra_env
        .push(("XDG_STATE_HOME".to_string(), cfg.state_dir().display().to_string()));
    Ok(())
}

/// Replace a tool's home-directory state path with a symlink into the
/// persistent `.state` tree. An existing mount point is the volume
/// doing the same job, so it is left alone.
fn redirect_home_path(home_path: &Path, target: &Path) -> std::io::Result<()> {
    if let Ok(existing) = std::fs::read_link(home_path) {
        if existing == target {
            return Ok(());
        }
        std::fs::remove_file(home_path)?;
    } else if home_path.exists() {
        if is_mount_point(home_path) {
            tracing::info!(path = %home_path.display(), "state path is a mount point, leaving it");
            return Ok(());
        }
        std::fs::remove_dir_all(home_path)?;
    }

    if let Some(parent) = home_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::os::unix::fs::symlink(target, home_path)
}

/// A directory on a different device than its parent is a mount point.
fn is_mount_point(path: &Path) -> bool {
    let Some(parent) = path.parent() else {
        return false;
    };
    match (std::fs::metadata(path), std::fs::metadata(parent)) {
        (Ok(meta), Ok(parent_meta)) => meta.dev() != parent_meta.dev(),
        _ => false,
    }
}

/// Write only when the content differs, keeping re-runs byte-identical
/// and mtimes stable.
pub(crate) fn write_if_changed(path: &Path, content: &[u8]) -> std::io::Result<()> {
    if let Ok(existing) = std::fs::read(path) {
        if existing == content {
            return Ok(());
        }
    }
    std::fs::write(path, content)
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
