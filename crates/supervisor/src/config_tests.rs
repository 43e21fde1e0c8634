// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::test_config;
use std::path::Path;

#[test]
fn valid_config_passes() {
    let cfg = test_config(Path::new("/workspace"));
    assert!(cfg.validate().is_ok());
}

#[test]
fn missing_tracker_url_fails() {
    let mut cfg = test_config(Path::new("/workspace"));
    cfg.tracker_url = String::new();
    assert!(matches!(cfg.validate(), Err(ConfigError::MissingTrackerUrl)));
}

#[test]
fn missing_agent_bead_fails() {
    let mut cfg = test_config(Path::new("/workspace"));
    cfg.agent_bead = None;
    assert!(matches!(cfg.validate(), Err(ConfigError::MissingAgentBead)));
}

#[test]
fn zero_max_restarts_fails() {
    let mut cfg = test_config(Path::new("/workspace"));
    cfg.max_restarts = 0;
    assert!(matches!(cfg.validate(), Err(ConfigError::InvalidMaxRestarts(0))));
}

#[test]
fn layout_paths_hang_off_workspace() {
    let cfg = test_config(Path::new("/w"));
    assert_eq!(cfg.tracker_config_path(), Path::new("/w/.beads/config.json"));
    assert_eq!(cfg.worktrees_dir(), Path::new("/w/.beads/worktrees"));
    assert_eq!(cfg.credentials_path(), Path::new("/w/.state/claude/.credentials.json"));
    assert_eq!(cfg.sessions_dir(), Path::new("/w/.state/claude/sessions"));
}

#[test]
fn public_url_prefers_pod_ip() {
    let mut cfg = test_config(Path::new("/w"));
    assert_eq!(cfg.coop_public_url(), "http://10.0.0.9:7777");
    cfg.pod_ip = String::new();
    assert_eq!(cfg.coop_public_url(), "http://localhost:7777");
}
