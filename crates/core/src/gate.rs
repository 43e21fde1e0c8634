// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session gates — named latches scoped to an agent record.
//!
//! A gate is either pending or satisfied. The `decision` gate governs
//! whether a model turn may end; the supervisor never satisfies it
//! directly — only the yield protocol or an operator force may, and both
//! stamp `gate_satisfied_by` on the agent record so a stop-hook evaluator
//! can reject any other transition.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The gate that governs end-of-turn.
pub const DECISION_GATE: &str = "decision";

/// Latch state of a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    Pending,
    Satisfied,
}

impl GateState {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateState::Pending => "pending",
            GateState::Satisfied => "satisfied",
        }
    }
}

impl fmt::Display for GateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The legitimate satisfiers of the decision gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateSatisfiedBy {
    Yield,
    Operator,
}

impl GateSatisfiedBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateSatisfiedBy::Yield => "yield",
            GateSatisfiedBy::Operator => "operator",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "yield" => Some(GateSatisfiedBy::Yield),
            "operator" => Some(GateSatisfiedBy::Operator),
            _ => None,
        }
    }
}

impl fmt::Display for GateSatisfiedBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named gate on an agent record, as returned by the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gate {
    pub id: String,
    pub state: GateState,
}

impl Gate {
    pub fn is_satisfied(&self) -> bool {
        self.state == GateState::Satisfied
    }
}

#[cfg(test)]
#[path = "gate_tests.rs"]
mod tests;
