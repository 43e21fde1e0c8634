// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn gate_state_serde() {
    assert_eq!(serde_json::to_string(&GateState::Pending).unwrap(), r#""pending""#);
    let parsed: GateState = serde_json::from_str(r#""satisfied""#).unwrap();
    assert_eq!(parsed, GateState::Satisfied);
}

#[yare::parameterized(
    yielded  = { "yield", Some(GateSatisfiedBy::Yield) },
    operator = { "operator", Some(GateSatisfiedBy::Operator) },
    agent    = { "agent", None },
    empty    = { "", None },
)]
fn satisfied_by_parse(text: &str, expected: Option<GateSatisfiedBy>) {
    assert_eq!(GateSatisfiedBy::parse(text), expected);
}

#[test]
fn gate_is_satisfied() {
    let gate = Gate { id: DECISION_GATE.to_string(), state: GateState::Pending };
    assert!(!gate.is_satisfied());
    let gate = Gate { id: DECISION_GATE.to_string(), state: GateState::Satisfied };
    assert!(gate.is_satisfied());
}
