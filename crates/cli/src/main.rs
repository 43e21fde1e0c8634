// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! roost: the agent-pod supervisor and its protocol commands.
//!
//! `roost run` is PID 1 of an agent pod. The remaining subcommands are
//! invoked inside the pod — by the model's hooks (`hook emit`), by the
//! model itself (`decision create`, `yield`, `artifact report`,
//! `worktree *`), or by an operator (`gate satisfy`).

mod commands;
mod exit_error;

use clap::{Parser, Subcommand};
use exit_error::ExitError;

#[derive(Parser)]
#[command(name = "roost", version, about = "Supervisor for a coop-hosted model agent")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the PID-1 supervisor.
    Run(commands::run::RunArgs),
    /// Hook plumbing for the model harness.
    #[command(subcommand)]
    Hook(commands::hook::HookCommand),
    /// Decision records for human-in-the-loop rendezvous.
    #[command(subcommand)]
    Decision(commands::decision::DecisionCommand),
    /// Wait for this agent's open decision to be resolved.
    Yield(commands::yield_cmd::YieldArgs),
    /// Deliver artifacts owed against resolved decisions.
    #[command(subcommand)]
    Artifact(commands::artifact::ArtifactCommand),
    /// Operator-only gate control.
    #[command(subcommand)]
    Gate(commands::gate::GateCommand),
    /// Per-task worktree management.
    #[command(subcommand)]
    Worktree(commands::worktree::WorktreeCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run(args) => commands::run::run(args).await,
        Commands::Hook(command) => commands::hook::run(command).await,
        Commands::Decision(command) => commands::decision::run(command).await,
        Commands::Yield(args) => commands::yield_cmd::run(args).await,
        Commands::Artifact(command) => commands::artifact::run(command).await,
        Commands::Gate(command) => commands::gate::run(command).await,
        Commands::Worktree(command) => commands::worktree::run(command).await,
    };

    if let Err(error) = result {
        match error.downcast::<ExitError>() {
            Ok(exit) => {
                if !exit.message.is_empty() {
                    eprintln!("{}", exit.message);
                }
                std::process::exit(exit.code);
            }
            Err(other) => {
                eprintln!("error: {:#}", other);
                std::process::exit(1);
            }
        }
    }
}
