// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session registry registration.
//!
//! The registry is a central multiplexer that lets operators and chat
//! bridges find a live agent's coop. Registration is best-effort in
//! every direction: the agent works fine unlisted, so no failure here
//! may take the supervisor down.

use crate::config::Config;
use crate::coop::CoopClient;
use crate::env;
use roost_core::Notes;
use roost_tracker::TrackerClient;
use std::time::Duration;

/// Health-poll attempts before registering (2s apart, 60s total).
const READY_ATTEMPTS: u32 = 30;

const REGISTRY_TIMEOUT: Duration = Duration::from_secs(10);

/// Register this session once the local coop answers health checks.
///
/// Also writes the coop's reachable URL into the agent record's notes so
/// tracker-side tooling can link to the live session. Always returns;
/// errors are logged as warnings.
pub async fn register(cfg: &Config, coop: &CoopClient, tracker: Option<&TrackerClient>) {
    if !wait_for_coop(coop).await {
        tracing::warn!("coop never became healthy, skipping registration");
        return;
    }

    publish_coop_url(cfg, tracker).await;

    if cfg.registry_url.is_empty() {
        tracing::debug!("no registry configured");
        return;
    }

    let payload = serde_json::json!({
        "url": cfg.coop_public_url(),
        "session_id": cfg.session_id.as_str(),
        "token": cfg.registry_token,
        "metadata": {
            "role": cfg.role,
            "project": cfg.project,
            "agent": cfg.agent_name,
            "pod": cfg.pod_name,
            "pod_ip": cfg.pod_ip,
        },
    });

    match registry_client() {
        Ok(http) => {
            let url = format!("{}/api/v1/sessions", cfg.registry_url.trim_end_matches('/'));
            let mut request = http.post(url).json(&payload);
            if !cfg.registry_token.is_empty() {
                request = request.bearer_auth(&cfg.registry_token);
            }
            match request.send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::info!(session = %cfg.session_id, "registered with session registry");
                }
                Ok(response) => {
                    tracing::warn!(status = %response.status(), "registry registration rejected");
                }
                Err(e) => tracing::warn!(error = %e, "registry registration failed"),
            }
        }
        Err(e) => tracing::warn!(error = %e, "could not build registry client"),
    }
}

/// Remove this session from the registry at shutdown. Best-effort.
pub async fn deregister(cfg: &Config) {
    if cfg.registry_url.is_empty() {
        return;
    }
    let Ok(http) = registry_client() else {
        return;
    };
    let url = format!(
        "{}/api/v1/sessions/{}",
        cfg.registry_url.trim_end_matches('/'),
        cfg.session_id
    );
    let mut request = http.delete(url);
    if !cfg.registry_token.is_empty() {
        request = request.bearer_auth(&cfg.registry_token);
    }
    if let Err(e) = request.send().await {
        tracing::warn!(error = %e, "registry deregistration failed");
    }
}

fn registry_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().timeout(REGISTRY_TIMEOUT).build()
}

async fn wait_for_coop(coop: &CoopClient) -> bool {
    for attempt in 0..READY_ATTEMPTS {
        if attempt > 0 {
            tokio::time::sleep(env::coop_ready_poll()).await;
        }
        if coop.healthy().await {
            return true;
        }
    }
    false
}

/// Upsert `coop_url: <url>` into the agent record's notes.
async fn publish_coop_url(cfg: &Config, tracker: Option<&TrackerClient>) {
    let Some(tracker) = tracker else { return };
    let Some(agent) = cfg.agent_bead.clone() else { return };

    let bead = match tracker.get_bead(&agent).await {
        Ok(bead) => bead,
        Err(e) => {
            tracing::warn!(error = %e, "could not read agent record for notes update");
            return;
        }
    };
    let mut notes = Notes::parse(&bead.notes);
    notes.upsert("coop_url", &cfg.coop_public_url());
    if let Err(e) = tracker.set_notes(&agent, &notes.render()).await {
        tracing::warn!(error = %e, "could not write coop url to agent notes");
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
