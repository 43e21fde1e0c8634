// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The tracker HTTP client.
//!
//! Control-plane calls carry a 15-second timeout; the SSE event stream
//! (see [`crate::events`]) is the one request without a deadline. All
//! calls authenticate with the bearer token from config.

use crate::error::TrackerError;
use crate::query::BeadQuery;
use roost_core::{Bead, BeadId, BeadType, FieldMap, Gate};
use serde::Serialize;
use std::time::Duration;

pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Payload for creating a record.
#[derive(Debug, Clone, Serialize)]
pub struct NewBead {
    #[serde(rename = "type")]
    pub bead_type: BeadType,
    pub title: String,
    #[serde(skip_serializing_if = "FieldMap::is_empty")]
    pub fields: FieldMap,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<BeadId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
}

impl NewBead {
    pub fn new(bead_type: BeadType, title: impl Into<String>) -> Self {
        Self {
            bead_type,
            title: title.into(),
            fields: FieldMap::new(),
            labels: Vec::new(),
            parent: None,
            priority: None,
        }
    }
}

/// Bearer-token client over the tracker's record API.
#[derive(Clone)]
pub struct TrackerClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl TrackerClient {
    /// Build a client for the given base URL (scheme + host, no trailing
    /// slash). The underlying reqwest client carries no default timeout —
    /// per-request deadlines are applied so the SSE stream can run
    /// unbounded.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self, TrackerError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        let base_url = base_url.into();
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_string(), token: token.into() })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/api/v1{}", self.base_url, path);
        let builder = self.http.request(method, url);
        if self.token.is_empty() {
            builder
        } else {
            builder.bearer_auth(&self.token)
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, TrackerError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(TrackerError::Status { status: status.as_u16(), body: body.trim().to_string() })
    }

    // ---- Records ----

    pub async fn get_bead(&self, id: &BeadId) -> Result<Bead, TrackerError> {
        let response = self
            .request(reqwest::Method::GET, &format!("/beads/{}", id))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(TrackerError::NotFound(id.clone()));
        }
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn list_beads(&self, query: &BeadQuery) -> Result<Vec<Bead>, TrackerError> {
        let response = self
            .request(reqwest::Method::GET, "/beads")
            .query(&query.to_params())
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn create_bead(&self, new: &NewBead) -> Result<Bead, TrackerError> {
        let response = self
            .request(reqwest::Method::POST, "/beads")
            .json(new)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// Merge `patch` into a record's fields.
    ///
    /// The server replaces the full fields JSON on update, so this reads
    /// the record, overlays the patch, and writes the whole map back.
    pub async fn update_fields(&self, id: &BeadId, patch: &FieldMap) -> Result<Bead, TrackerError> {
        self.edit_fields(id, |fields| fields.merge(patch)).await
    }

    /// Read-modify-write over a record's fields for edits a merge can't
    /// express (removals, conditional updates).
    pub async fn edit_fields<F>(&self, id: &BeadId, edit: F) -> Result<Bead, TrackerError>
    where
        F: FnOnce(&mut FieldMap),
    {
        let mut fields = self.get_bead(id).await?.fields;
        edit(&mut fields);
        let response = self
            .request(reqwest::Method::PATCH, &format!("/beads/{}", id))
            .json(&serde_json::json!({ "fields": fields }))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// Replace a record's notes text.
    pub async fn set_notes(&self, id: &BeadId, notes: &str) -> Result<(), TrackerError> {
        let response = self
            .request(reqwest::Method::PATCH, &format!("/beads/{}", id))
            .json(&serde_json::json!({ "notes": notes }))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Close a record, merging `fields` in the same request.
    ///
    /// The server merges close-request fields without type-schema
    /// validation, which the decision lifecycle depends on for stamping
    /// resolution metadata.
    pub async fn close_bead(&self, id: &BeadId, fields: &FieldMap) -> Result<(), TrackerError> {
        let body = if fields.is_empty() {
            serde_json::json!({})
        } else {
            serde_json::json!({ "fields": fields })
        };
        let response = self
            .request(reqwest::Method::POST, &format!("/beads/{}/close", id))
            .json(&body)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    // ---- Gates ----

    pub async fn list_gates(&self, agent: &BeadId) -> Result<Vec<Gate>, TrackerError> {
        let response = self
            .request(reqwest::Method::GET, &format!("/agents/{}/gates", agent))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn satisfy_gate(&self, agent: &BeadId, gate: &str) -> Result<(), TrackerError> {
        let response = self
            .request(reqwest::Method::POST, &format!("/agents/{}/gates/{}/satisfy", agent, gate))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    pub async fn clear_gate(&self, agent: &BeadId, gate: &str) -> Result<(), TrackerError> {
        let response = self
            .request(reqwest::Method::POST, &format!("/agents/{}/gates/{}/clear", agent, gate))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
