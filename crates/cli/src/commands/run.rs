// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `roost run` supervisor entrypoint.
//!
//! Composition order: config → workspace provisioning → credential
//! cascade → background tasks (signals, credential refresh, registry
//! registration) → the session restart loop. Shutdown deregisters from
//! the registry best-effort and exits with the loop's code.

use crate::exit_error::ExitError;
use anyhow::{Context, Result};
use roost_core::SessionId;
use roost_supervisor::{
    config::Config, coop::CoopClient, credentials, registry, workspace, SessionSupervisor,
    SystemClock,
};
use roost_tracker::TrackerClient;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

#[derive(Debug, clap::Args)]
pub struct RunArgs {
    #[arg(long, env = "ROOST_WORKSPACE", default_value = "/workspace")]
    workspace: PathBuf,

    #[arg(long, env = "ROOST_COOP_PORT", default_value_t = 7777)]
    coop_port: u16,

    #[arg(long, env = "ROOST_COOP_HEALTH_PORT", default_value_t = 7778)]
    coop_health_port: u16,

    /// Consecutive fast failures tolerated before giving up.
    #[arg(long, env = "ROOST_MAX_RESTARTS", default_value_t = 10)]
    max_restarts: u32,

    /// Shell command producing the model process.
    #[arg(
        long,
        env = "ROOST_AGENT_COMMAND",
        default_value = "claude --dangerously-skip-permissions"
    )]
    agent_command: String,

    /// Resume the most recent session log on restart.
    #[arg(long, env = "ROOST_RESUME", default_value_t = true, action = clap::ArgAction::Set)]
    resume: bool,

    #[arg(long, env = "ROOST_ROLE", default_value = "worker")]
    role: String,

    #[arg(long, env = "ROOST_PROJECT", default_value = "")]
    project: String,

    #[arg(long, env = "ROOST_AGENT_NAME", default_value = "")]
    agent_name: String,

    /// This agent's record in the tracker.
    #[arg(long, env = "ROOST_AGENT_BEAD")]
    agent_bead: Option<String>,

    #[arg(long, env = "ROOST_POD_NAME", default_value = "")]
    pod_name: String,

    #[arg(long, env = "KUBERNETES_POD_IP", default_value = "")]
    pod_ip: String,

    #[arg(long, env = "ROOST_TRACKER_URL", default_value = "")]
    tracker_url: String,

    #[arg(long, env = "ROOST_TRACKER_TOKEN", default_value = "", hide_env_values = true)]
    tracker_token: String,

    #[arg(long, env = "ROOST_REGISTRY_URL", default_value = "")]
    registry_url: String,

    #[arg(long, env = "ROOST_REGISTRY_TOKEN", default_value = "", hide_env_values = true)]
    registry_token: String,

    #[arg(long, env = "CLAUDE_CODE_OAUTH_TOKEN", default_value = "", hide_env_values = true)]
    oauth_token: String,

    #[arg(long, env = "ANTHROPIC_API_KEY", default_value = "", hide_env_values = true)]
    api_key: String,

    #[arg(long, env = "GIT_USER_NAME", default_value = "")]
    git_user_name: String,

    #[arg(long, env = "GIT_USER_EMAIL", default_value = "")]
    git_user_email: String,

    #[arg(long, env = "GITHUB_TOKEN", default_value = "", hide_env_values = true)]
    git_token: String,

    /// Env var names forwarded to the child untouched.
    #[arg(long = "passthrough", env = "ROOST_PASSTHROUGH_ENV", value_delimiter = ',')]
    passthrough_env: Vec<String>,
}

impl RunArgs {
    fn into_config(self) -> Config {
        Config {
            workspace: self.workspace,
            coop_port: self.coop_port,
            coop_health_port: self.coop_health_port,
            max_restarts: self.max_restarts,
            agent_command: self.agent_command,
            resume_enabled: self.resume,
            role: self.role,
            project: self.project,
            agent_name: self.agent_name,
            agent_bead: self
                .agent_bead
                .filter(|s| !s.is_empty())
                .map(roost_core::BeadId::new),
            pod_name: self.pod_name,
            pod_ip: self.pod_ip,
            tracker_url: self.tracker_url,
            tracker_token: self.tracker_token,
            registry_url: self.registry_url,
            registry_token: self.registry_token,
            oauth_token: self.oauth_token,
            api_key: self.api_key,
            git_user_name: self.git_user_name,
            git_user_email: self.git_user_email,
            git_token: self.git_token,
            passthrough_env: self.passthrough_env,
            session_id: SessionId::new(uuid::Uuid::new_v4().to_string()),
        }
    }
}

pub async fn run(args: RunArgs) -> Result<()> {
    let cfg = args.into_config();
    cfg.validate().map_err(|e| ExitError::new(1, e.to_string()))?;

    let tracker = TrackerClient::new(&cfg.tracker_url, &cfg.tracker_token)
        .context("building tracker client")?;

    let cancel = CancellationToken::new();
    spawn_signal_handler(cancel.clone());

    let outcome = workspace::setup(&cfg, Some(&tracker))
        .await
        .context("workspace setup")?;

    let mode = credentials::provision(&cfg).await;
    tracing::info!(%mode, "credential provisioning complete");

    let coop = CoopClient::new(cfg.coop_port, cfg.coop_health_port)
        .context("building coop client")?;

    // Background: credential refresh for the life of the process.
    let refresh_task = {
        let cfg = cfg.clone();
        let coop = coop.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { credentials::refresh_loop(&cfg, mode, &coop, cancel).await })
    };

    // Background: fire-and-forget registration once coop is healthy.
    {
        let cfg = cfg.clone();
        let coop = coop.clone();
        let tracker = tracker.clone();
        tokio::spawn(async move { registry::register(&cfg, &coop, Some(&tracker)).await });
    }

    let mut supervisor = SessionSupervisor::new(
        cfg.clone(),
        Some(tracker),
        SystemClock,
        cancel.clone(),
        outcome.extra_env,
    );

    let mut run_loop = std::pin::pin!(supervisor.run());
    let exit_code = tokio::select! {
        code = &mut run_loop => code,
        result = refresh_task => {
            match result {
                Ok(credentials::RefreshExit::CircuitBroken) => {
                    cancel.cancel();
                    // Let the in-flight session wind down before exiting.
                    let _ = run_loop.await;
                    1
                }
                // The refresh task bowed out (api-key mode or cancel);
                // the session loop carries on.
                _ => run_loop.await,
            }
        }
    };

    registry::deregister(&cfg).await;

    if exit_code != 0 {
        return Err(ExitError::new(exit_code, "").into());
    }
    Ok(())
}

/// Translate SIGTERM/SIGINT into top-level cancellation. The in-flight
/// session finishes; the restart loop then exits zero.
fn spawn_signal_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        use tokio::signal::unix::{signal, SignalKind};
        let (Ok(mut term), Ok(mut int)) =
            (signal(SignalKind::terminate()), signal(SignalKind::interrupt()))
        else {
            tracing::warn!("could not install signal handlers");
            return;
        };
        tokio::select! {
            _ = term.recv() => tracing::info!("received SIGTERM"),
            _ = int.recv() => tracing::info!("received SIGINT"),
        }
        cancel.cancel();
    });
}
