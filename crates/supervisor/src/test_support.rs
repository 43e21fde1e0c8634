// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for supervisor tests.

use crate::config::Config;
use roost_core::{BeadId, SessionId};
use std::path::Path;

pub(crate) fn test_config(workspace: &Path) -> Config {
    Config {
        workspace: workspace.to_path_buf(),
        coop_port: 7777,
        coop_health_port: 7778,
        max_restarts: 10,
        agent_command: "claude --dangerously-skip-permissions".to_string(),
        resume_enabled: true,
        role: "worker".to_string(),
        project: "demo".to_string(),
        agent_name: "ada".to_string(),
        agent_bead: Some(BeadId::new("bd-3")),
        pod_name: "pod-0".to_string(),
        pod_ip: "10.0.0.9".to_string(),
        tracker_url: "http://tracker.test".to_string(),
        tracker_token: "tok".to_string(),
        registry_url: String::new(),
        registry_token: String::new(),
        oauth_token: String::new(),
        api_key: String::new(),
        git_user_name: String::new(),
        git_user_email: String::new(),
        git_token: String::new(),
        passthrough_env: Vec::new(),
        session_id: SessionId::new("boot-1"),
    }
}
