// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracker client error type.

use roost_core::BeadId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("tracker request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("tracker returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode tracker response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("record not found: {0}")]
    NotFound(BeadId),

    #[error("event stream ended")]
    StreamClosed,
}

impl TrackerError {
    /// Whether a retry can reasonably be expected to succeed.
    ///
    /// Network-level failures and server 5xx responses are transient;
    /// 4xx responses and decode failures are not.
    pub fn is_transient(&self) -> bool {
        match self {
            TrackerError::Http(_) | TrackerError::StreamClosed => true,
            TrackerError::Status { status, .. } => *status >= 500,
            TrackerError::Decode(_) | TrackerError::NotFound(_) => false,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
