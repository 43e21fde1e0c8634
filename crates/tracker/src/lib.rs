// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! roost-tracker: HTTP client for the beads tracker.
//!
//! Everything the supervisor coordinates through goes over this client:
//! record CRUD and queries, the read-modify-write field merge (the server
//! replaces the full fields object on update), close-with-fields, session
//! gates, hook-event emission with its fixed retry schedule, and the SSE
//! record-event stream with a polling fallback.

pub mod client;
pub mod error;
pub mod events;
pub mod hooks;
pub mod query;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use client::{NewBead, TrackerClient};
pub use error::TrackerError;
pub use events::{EventStream, RecordEvent, RecordEventKind, SseParser};
pub use hooks::{HookEvent, HookVerdict, RETRY_SCHEDULE};
pub use query::BeadQuery;
