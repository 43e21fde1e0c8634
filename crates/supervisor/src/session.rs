// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The session restart loop — the supervisor's center of gravity.
//!
//! One coop child runs at a time. Sessions that die quickly count
//! against a consecutive-restart budget; any session that ran at least
//! `MIN_RUNTIME` proves the setup works and resets the counter. Between
//! sessions the loop honors stop requests from the tracker (stop is
//! advisory: the in-flight session always runs to completion) and
//! retires the resume log of a failed session so the next attempt
//! starts clean.

use crate::config::Config;
use crate::coop::CoopClient;
use crate::helpers;
use parking_lot::Mutex;
use roost_core::{AgentState, FieldMap};
use roost_tracker::TrackerClient;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// A session that survives this long is not a crash loop.
const MIN_RUNTIME: Duration = Duration::from_secs(30);

/// Pause between session attempts.
const RESTART_DELAY: Duration = Duration::from_secs(2);

/// This many retired logs disables resume for the pod lifetime.
const STALE_LOG_LIMIT: usize = 2;

/// Grace period between SIGTERM and SIGKILL on shutdown.
const KILL_GRACE: Duration = Duration::from_secs(10);

/// Suffix marking a session log as never-resume.
const STALE_SUFFIX: &str = "stale";

/// Monotonic time source for measuring session runtime. The restart
/// throttle is the only time-sensitive decision in the loop, so this is
/// all the clock the supervisor carries.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Hand-advanced clock backing the restart-throttle tests.
#[derive(Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self { now: Arc::new(Mutex::new(Instant::now())) }
    }

    pub fn advance(&self, duration: Duration) {
        *self.now.lock() += duration;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}

/// Consecutive-restart budget after a session ends: a session that ran
/// at least `MIN_RUNTIME` was not a crash loop and clears the count.
fn next_restart_count(restarts: u32, elapsed: Duration) -> u32 {
    if elapsed >= MIN_RUNTIME {
        1
    } else {
        restarts + 1
    }
}

/// Runs coop sessions until stopped, crash-looped out, or cancelled.
pub struct SessionSupervisor<C: Clock> {
    cfg: Config,
    tracker: Option<TrackerClient>,
    clock: C,
    cancel: CancellationToken,
    resume_disabled: bool,
    extra_env: Vec<(String, String)>,
}

impl<C: Clock> SessionSupervisor<C> {
    pub fn new(
        cfg: Config,
        tracker: Option<TrackerClient>,
        clock: C,
        cancel: CancellationToken,
        extra_env: Vec<(String, String)>,
    ) -> Self {
        Self { cfg, tracker, clock, cancel, resume_disabled: false, extra_env }
    }

    /// The restart loop. Returns the process exit code.
    pub async fn run(&mut self) -> i32 {
        let mut restarts: u32 = 0;

        loop {
            if self.cancel.is_cancelled() {
                return 0;
            }
            if restarts >= self.cfg.max_restarts {
                tracing::error!(restarts, "max restarts reached");
                return 1;
            }

            self.clean_stale_pipes();
            let resume_log = self.find_resume_session();

            let start = self.clock.now();
            let exit_code = self.run_one_session(resume_log.as_deref()).await;
            let elapsed = self.clock.now() - start;
            tracing::info!(exit_code, elapsed_secs = elapsed.as_secs(), "session ended");

            if self.cancel.is_cancelled() {
                return 0;
            }

            // A failed session must not resume the same conversation again.
            if exit_code != 0 {
                if let Some(ref log) = resume_log {
                    retire(log);
                }
            }

            if self.stop_requested().await {
                tracing::info!("stop requested, closing agent record");
                self.close_agent_record().await;
                return 0;
            }

            restarts = next_restart_count(restarts, elapsed);

            tokio::select! {
                _ = self.cancel.cancelled() => return 0,
                _ = tokio::time::sleep(RESTART_DELAY) => {}
            }
        }
    }

    /// Launch one coop child, attend it with helpers, and wait it out.
    async fn run_one_session(&self, resume_log: Option<&Path>) -> i32 {
        let mut cmd = tokio::process::Command::new("coop");
        cmd.arg("--agent")
            .arg("claude")
            .arg("--port")
            .arg(self.cfg.coop_port.to_string())
            .arg("--health-port")
            .arg(self.cfg.coop_health_port.to_string())
            .arg("--cols")
            .arg("200")
            .arg("--rows")
            .arg("50");
        if let Some(log) = resume_log {
            cmd.arg("--resume").arg(log);
        }
        cmd.arg("--")
            .arg("bash")
            .arg("-lc")
            .arg(&self.cfg.agent_command)
            .current_dir(&self.cfg.workspace)
            .env("COOP_LOG", "info");
        for (key, value) in &self.extra_env {
            cmd.env(key, value);
        }
        // Named provider secrets forwarded explicitly, on top of the
        // inherited environment.
        for name in &self.cfg.passthrough_env {
            if let Ok(value) = std::env::var(name) {
                cmd.env(name, value);
            }
        }

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::error!(error = %e, "failed to spawn coop");
                return 1;
            }
        };
        tracing::info!(
            pid = ?child.id(),
            resume = resume_log.is_some(),
            "coop session started"
        );

        // Helpers live on a child token so session end stops them
        // without touching the top-level cancellation.
        let session = self.cancel.child_token();
        match CoopClient::new(self.cfg.coop_port, self.cfg.coop_health_port) {
            Ok(coop) => {
                tokio::spawn(helpers::startup_prompt_bypass(coop.clone(), session.clone()));
                tokio::spawn(helpers::inject_initial_prompt(
                    coop.clone(),
                    session.clone(),
                    self.cfg.role.clone(),
                ));
                tokio::spawn(helpers::monitor_child_exit(coop, session.clone()));
            }
            Err(e) => tracing::warn!(error = %e, "coop client unavailable, helpers not started"),
        }

        let exit_code = tokio::select! {
            status = child.wait() => match status {
                Ok(status) => status.code().unwrap_or(1),
                Err(e) => {
                    tracing::error!(error = %e, "failed to wait on coop");
                    1
                }
            },
            _ = self.cancel.cancelled() => {
                self.terminate(&mut child).await
            }
        };

        session.cancel();
        exit_code
    }

    /// SIGTERM, a grace period, then SIGKILL.
    async fn terminate(&self, child: &mut tokio::process::Child) -> i32 {
        if let Some(pid) = child.id() {
            let _ = nix::sys::signal::kill(
                nix::unistd::Pid::from_raw(pid as i32),
                nix::sys::signal::Signal::SIGTERM,
            );
        }
        match tokio::time::timeout(KILL_GRACE, child.wait()).await {
            Ok(Ok(status)) => status.code().unwrap_or(0),
            _ => {
                tracing::warn!("coop did not exit after SIGTERM, killing");
                let _ = child.start_kill();
                match child.wait().await {
                    Ok(status) => status.code().unwrap_or(1),
                    Err(_) => 1,
                }
            }
        }
    }

    /// Most recent resumable session log, if resume is allowed.
    fn find_resume_session(&mut self) -> Option<PathBuf> {
        if !self.cfg.resume_enabled || self.resume_disabled {
            return None;
        }
        let scan = scan_sessions(&self.cfg.sessions_dir());
        if scan.stale >= STALE_LOG_LIMIT {
            tracing::warn!(
                stale = scan.stale,
                "too many retired session logs, disabling resume for this pod"
            );
            self.resume_disabled = true;
            return None;
        }
        scan.log
    }

    /// Remove leftover control pipes from a previous coop that died
    /// without cleanup.
    fn clean_stale_pipes(&self) {
        let dir = self.cfg.state_dir().join("coop");
        let Ok(entries) = std::fs::read_dir(&dir) else {
            return;
        };
        for entry in entries.filter_map(Result::ok) {
            let path = entry.path();
            let is_pipe = path
                .extension()
                .map(|ext| ext == "pipe" || ext == "sock")
                .unwrap_or(false);
            if is_pipe {
                tracing::debug!(path = %path.display(), "removing stale pipe");
                let _ = std::fs::remove_file(&path);
            }
        }
    }

    /// Consult the tracker between sessions only (stop is advisory).
    async fn stop_requested(&self) -> bool {
        let Some(ref tracker) = self.tracker else {
            return false;
        };
        let Some(agent) = self.cfg.agent_bead.clone() else {
            return false;
        };
        match tracker.get_bead(&agent).await {
            Ok(bead) => bead.fields.stop_requested(),
            Err(e) => {
                tracing::warn!(error = %e, "could not check stop_requested");
                false
            }
        }
    }

    /// Close out the agent record with a terminal state.
    async fn close_agent_record(&self) {
        let Some(ref tracker) = self.tracker else {
            return;
        };
        let Some(agent) = self.cfg.agent_bead.clone() else {
            return;
        };
        let mut fields = FieldMap::new();
        fields.set(roost_core::fields::FIELD_AGENT_STATE, AgentState::Done.as_str());
        if let Err(e) = tracker.close_bead(&agent, &fields).await {
            tracing::warn!(error = %e, "failed to close agent record");
        }
    }
}

/// What a session-log directory currently holds.
#[derive(Debug, Default)]
pub(crate) struct SessionScan {
    pub log: Option<PathBuf>,
    pub stale: usize,
}

/// Walk the session-log directory: count retired logs and find the most
/// recently modified live one.
pub(crate) fn scan_sessions(dir: &Path) -> SessionScan {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return SessionScan::default();
    };

    let mut scan = SessionScan::default();
    let mut newest = std::time::SystemTime::UNIX_EPOCH;
    for entry in entries.filter_map(Result::ok) {
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();

        if name.ends_with(&format!(".jsonl.{}", STALE_SUFFIX)) {
            scan.stale += 1;
            continue;
        }
        if !name.ends_with(".jsonl") {
            continue;
        }
        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(std::time::SystemTime::UNIX_EPOCH);
        if scan.log.is_none() || modified > newest {
            newest = modified;
            scan.log = Some(path);
        }
    }
    scan
}

/// Rename a session log so it is never resumed again. Idempotent: a log
/// already carrying the suffix is left alone.
pub(crate) fn retire(log: &Path) {
    if log.extension().map(|ext| ext == STALE_SUFFIX).unwrap_or(false) {
        return;
    }
    let Some(name) = log.file_name() else {
        return;
    };
    let mut stale_name = name.to_os_string();
    stale_name.push(".");
    stale_name.push(STALE_SUFFIX);
    let target = log.with_file_name(stale_name);
    match std::fs::rename(log, &target) {
        Ok(()) => tracing::info!(log = %log.display(), "retired session log"),
        Err(e) => tracing::warn!(log = %log.display(), error = %e, "failed to retire session log"),
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
