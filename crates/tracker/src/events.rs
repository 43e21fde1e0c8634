// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Server-Sent-Events feed of tracker record events.
//!
//! The stream request carries no deadline. Consumers that lose the
//! stream fall back to 2-second polling — reconnect backoff is not
//! needed because polling is the steady state once SSE is gone.

use crate::client::TrackerClient;
use crate::error::TrackerError;
use futures_util::StreamExt;
use roost_core::BeadId;
use serde::Deserialize;
use std::collections::VecDeque;

/// What happened to a record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum RecordEventKind {
    Created,
    Updated,
    Closed,
    Other(String),
}

impl From<String> for RecordEventKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "created" => RecordEventKind::Created,
            "updated" => RecordEventKind::Updated,
            "closed" => RecordEventKind::Closed,
            _ => RecordEventKind::Other(s),
        }
    }
}

/// One record event from the feed.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordEvent {
    pub bead_id: BeadId,
    pub kind: RecordEventKind,
}

/// A single SSE frame: optional event name plus joined data lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseMessage {
    pub event: Option<String>,
    pub data: String,
}

/// Incremental SSE frame parser.
///
/// Fed raw chunks as they arrive; yields complete frames on each blank
/// line. Comment lines (leading `:`) are dropped per the SSE spec.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: String,
    event: Option<String>,
    data: Vec<String>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk; returns every frame completed by it.
    pub fn feed(&mut self, chunk: &str) -> Vec<SseMessage> {
        self.buffer.push_str(chunk);
        let mut messages = Vec::new();

        while let Some(pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=pos).collect();
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if !self.data.is_empty() {
                    messages.push(SseMessage {
                        event: self.event.take(),
                        data: self.data.join("\n"),
                    });
                    self.data.clear();
                } else {
                    self.event = None;
                }
            } else if let Some(value) = line.strip_prefix("event:") {
                self.event = Some(value.trim().to_string());
            } else if let Some(value) = line.strip_prefix("data:") {
                self.data.push(value.trim_start_matches(' ').to_string());
            }
            // field lines we don't use (id:, retry:) and comments fall through
        }

        messages
    }
}

/// Live SSE subscription to record events.
pub struct EventStream {
    bytes: futures_util::stream::BoxStream<'static, reqwest::Result<Vec<u8>>>,
    parser: SseParser,
    pending: VecDeque<RecordEvent>,
}

impl EventStream {
    /// Next record event, or `None` when the stream has ended.
    ///
    /// Frames that don't decode as record events (heartbeats, unrelated
    /// topics) are skipped.
    pub async fn next(&mut self) -> Option<Result<RecordEvent, TrackerError>> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(Ok(event));
            }
            match self.bytes.next().await? {
                Ok(chunk) => {
                    let text = String::from_utf8_lossy(&chunk).into_owned();
                    for message in self.parser.feed(&text) {
                        if let Ok(event) = serde_json::from_str::<RecordEvent>(&message.data) {
                            self.pending.push_back(event);
                        }
                    }
                }
                Err(e) => return Some(Err(TrackerError::Http(e))),
            }
        }
    }
}

impl TrackerClient {
    /// Subscribe to the record-event feed, filtered by topic
    /// (e.g. `records.>` for all record events).
    pub async fn events(&self, topic: &str) -> Result<EventStream, TrackerError> {
        let response = self
            .request(reqwest::Method::GET, "/events")
            .query(&[("topic", topic)])
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TrackerError::Status { status: status.as_u16(), body: body.trim().to_string() });
        }
        Ok(EventStream {
            bytes: response.bytes_stream().map(|r| r.map(|b| b.to_vec())).boxed(),
            parser: SseParser::new(),
            pending: VecDeque::new(),
        })
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
