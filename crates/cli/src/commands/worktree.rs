// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-task worktree commands, wrapping the supervisor's manager.
//!
//! Run inside the pod by claim flows, strictly off the session critical
//! path. `audit` never blocks anything: it reports and exits zero.

use super::TrackerArgs;
use anyhow::Result;
use roost_core::{BeadId, SessionId};
use roost_supervisor::{config::Config, worktree};
use std::path::PathBuf;

#[derive(Debug, clap::Args)]
pub struct WorktreeArgs {
    #[arg(long, env = "ROOST_WORKSPACE", default_value = "/workspace")]
    workspace: PathBuf,

    #[arg(long, env = "ROOST_AGENT_BEAD")]
    agent: Option<String>,

    #[command(flatten)]
    tracker: TrackerArgs,
}

#[derive(Debug, clap::Subcommand)]
pub enum WorktreeCommand {
    /// Create the isolated worktree for a claimed task.
    Setup {
        task: String,
        #[command(flatten)]
        args: WorktreeArgs,
    },
    /// Remove a task's worktree and clear its records.
    Teardown {
        task: String,
        #[command(flatten)]
        args: WorktreeArgs,
    },
    /// List worktrees and report uncommitted changes.
    Audit {
        #[command(flatten)]
        args: WorktreeArgs,
    },
}

/// A minimal supervisor config for out-of-band worktree work.
fn worktree_config(args: &WorktreeArgs) -> Config {
    Config {
        workspace: args.workspace.clone(),
        coop_port: 0,
        coop_health_port: 0,
        max_restarts: 1,
        agent_command: String::new(),
        resume_enabled: false,
        role: String::new(),
        project: String::new(),
        agent_name: String::new(),
        agent_bead: args.agent.clone().filter(|s| !s.is_empty()).map(BeadId::new),
        pod_name: String::new(),
        pod_ip: String::new(),
        tracker_url: args.tracker.tracker_url.clone(),
        tracker_token: args.tracker.tracker_token.clone(),
        registry_url: String::new(),
        registry_token: String::new(),
        oauth_token: String::new(),
        api_key: String::new(),
        git_user_name: String::new(),
        git_user_email: String::new(),
        git_token: String::new(),
        passthrough_env: Vec::new(),
        session_id: SessionId::new(""),
    }
}

pub async fn run(command: WorktreeCommand) -> Result<()> {
    match command {
        WorktreeCommand::Setup { task, args } => {
            let cfg = worktree_config(&args);
            let client = args.tracker.client()?;
            let workspace = worktree::setup(&cfg, &client, &BeadId::new(task)).await?;
            println!("{} @ {}", workspace.branch, workspace.path);
            Ok(())
        }
        WorktreeCommand::Teardown { task, args } => {
            let cfg = worktree_config(&args);
            let client = args.tracker.client()?;
            worktree::teardown(&cfg, &client, &BeadId::new(task)).await?;
            Ok(())
        }
        WorktreeCommand::Audit { args } => {
            let cfg = worktree_config(&args);
            let report = worktree::audit(&cfg).await;
            for entry in &report {
                let marker = if entry.dirty { "dirty" } else { "clean" };
                println!("{}\t{}\t{}", entry.task_id, marker, entry.path.display());
            }
            if report.is_empty() {
                println!("no worktrees");
            }
            Ok(())
        }
    }
}
