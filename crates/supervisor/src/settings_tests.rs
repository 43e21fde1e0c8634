// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn settings_document_shape() {
    let dir = tempfile::tempdir().unwrap();
    let hooks = crate::hooks::default_hooks();

    write_settings(dir.path(), &hooks).unwrap();

    let content = std::fs::read_to_string(settings_path(dir.path())).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(parsed["permissions"]["allow"][0], serde_json::json!("Bash"));
    assert!(parsed["hooks"]["Stop"].is_array());
}

#[test]
fn write_settings_is_byte_identical_on_rerun() {
    let dir = tempfile::tempdir().unwrap();
    let hooks = crate::hooks::default_hooks();

    write_settings(dir.path(), &hooks).unwrap();
    let first = std::fs::read(settings_path(dir.path())).unwrap();
    write_settings(dir.path(), &hooks).unwrap();
    assert_eq!(std::fs::read(settings_path(dir.path())).unwrap(), first);
}

#[test]
fn role_instructions_append_once() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(instructions_path(dir.path()), "# Project\n").unwrap();

    append_role_instructions(dir.path(), "reviewer").unwrap();
    let first = std::fs::read_to_string(instructions_path(dir.path())).unwrap();
    assert!(first.starts_with("# Project\n"));
    assert!(first.contains("`reviewer` agent"));

    append_role_instructions(dir.path(), "reviewer").unwrap();
    let second = std::fs::read_to_string(instructions_path(dir.path())).unwrap();
    assert_eq!(first, second);
}

#[test]
fn role_instructions_create_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    append_role_instructions(dir.path(), "worker").unwrap();
    let content = std::fs::read_to_string(instructions_path(dir.path())).unwrap();
    assert!(content.contains(ROLE_MARKER));
}
