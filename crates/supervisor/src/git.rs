// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Git subprocess helper.
//!
//! All git work runs through here so every call gets the same timeout,
//! environment scrubbing, and error shape. Callers of worktree
//! setup/teardown run strictly off the session critical path, so git
//! operations serialize on the workspace directory naturally.

use std::path::Path;
use std::process::Output;
use std::time::Duration;
use thiserror::Error;

const GIT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum GitError {
    #[error("failed to run git: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("git {args} failed: {stderr}")]
    Command { args: String, stderr: String },

    #[error("git {0} timed out")]
    Timeout(String),
}

/// Run git in `dir`, requiring success.
pub async fn git(dir: &Path, args: &[&str]) -> Result<Output, GitError> {
    let output = git_unchecked(dir, args).await?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(GitError::Command { args: args.join(" "), stderr });
    }
    Ok(output)
}

/// Run git in `dir`, returning the raw output regardless of status.
pub async fn git_unchecked(dir: &Path, args: &[&str]) -> Result<Output, GitError> {
    let mut cmd = tokio::process::Command::new("git");
    cmd.arg("-C")
        .arg(dir)
        .args(args)
        .env_remove("GIT_DIR")
        .env_remove("GIT_WORK_TREE");
    tokio::time::timeout(GIT_TIMEOUT, cmd.output())
        .await
        .map_err(|_| GitError::Timeout(args.join(" ")))?
        .map_err(GitError::Spawn)
}

/// Stdout of a successful git call, trimmed.
pub async fn git_stdout(dir: &Path, args: &[&str]) -> Result<String, GitError> {
    let output = git(dir, args).await?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Whether `dir` is inside a git work tree.
pub async fn is_repo(dir: &Path) -> bool {
    git_unchecked(dir, &["rev-parse", "--is-inside-work-tree"])
        .await
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// The default branch: `origin/HEAD` when set, otherwise `main`.
pub async fn default_branch(dir: &Path) -> String {
    if let Ok(reference) =
        git_stdout(dir, &["symbolic-ref", "refs/remotes/origin/HEAD", "--short"]).await
    {
        if let Some(branch) = reference.strip_prefix("origin/") {
            return branch.to_string();
        }
    }
    "main".to_string()
}

/// The currently checked-out branch, if HEAD is on one.
pub async fn current_branch(dir: &Path) -> Option<String> {
    git_stdout(dir, &["rev-parse", "--abbrev-ref", "HEAD"])
        .await
        .ok()
        .filter(|b| !b.is_empty() && b != "HEAD")
}

/// Whether the work tree has uncommitted changes (staged or not).
pub async fn is_dirty(dir: &Path) -> bool {
    git_stdout(dir, &["status", "--porcelain"])
        .await
        .map(|s| !s.is_empty())
        .unwrap_or(false)
}
