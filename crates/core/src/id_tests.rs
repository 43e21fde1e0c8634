// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn bead_id_display() {
    let id = BeadId::new("bd-42");
    assert_eq!(format!("{}", id), "bd-42");
    assert_eq!(id.as_str(), "bd-42");
}

#[test]
fn bead_id_from_conversions() {
    let id1: BeadId = "bd-1".into();
    let id2: BeadId = String::from("bd-1").into();
    assert_eq!(id1, id2);
    assert_eq!(id1, *"bd-1");
}

#[test]
fn bead_id_serde_is_transparent() {
    let id = BeadId::new("bd-7");
    assert_eq!(serde_json::to_string(&id).unwrap(), r#""bd-7""#);
    let parsed: BeadId = serde_json::from_str(r#""bd-7""#).unwrap();
    assert_eq!(parsed, id);
}

#[test]
fn session_id_display() {
    let id = SessionId::new("f2a9");
    assert_eq!(id.to_string(), "f2a9");
}
