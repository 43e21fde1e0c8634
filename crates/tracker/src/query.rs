// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Record list query builder.

use roost_core::{BeadStatus, BeadType};

/// Filters and sort order for listing records.
///
/// Sort keys follow the tracker convention: a leading `-` inverts the
/// order, so `-created_at` is newest-first.
#[derive(Debug, Clone, Default)]
pub struct BeadQuery {
    pub status: Option<BeadStatus>,
    pub bead_type: Option<BeadType>,
    pub label: Option<String>,
    pub assignee: Option<String>,
    pub field_filters: Vec<(String, String)>,
    pub sort: Option<String>,
    pub limit: Option<usize>,
}

impl BeadQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: BeadStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn bead_type(mut self, bead_type: BeadType) -> Self {
        self.bead_type = Some(bead_type);
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }

    /// Filter on a record field (`field.<key>=<value>` in the query string).
    pub fn field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.field_filters.push((key.into(), value.into()));
        self
    }

    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Render as query-string pairs.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(ref status) = self.status {
            params.push(("status".to_string(), status.as_str().to_string()));
        }
        if let Some(ref bead_type) = self.bead_type {
            params.push(("type".to_string(), bead_type.as_str().to_string()));
        }
        if let Some(ref label) = self.label {
            params.push(("label".to_string(), label.clone()));
        }
        if let Some(ref assignee) = self.assignee {
            params.push(("assignee".to_string(), assignee.clone()));
        }
        for (key, value) in &self.field_filters {
            params.push((format!("field.{}", key), value.clone()));
        }
        if let Some(ref sort) = self.sort {
            params.push(("sort".to_string(), sort.clone()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;
