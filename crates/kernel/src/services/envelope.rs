//! Uniform success/error response envelopes.
//!
//! Every execution method returns a [`QueryOutcome`] that serializes straight
//! to the JSON body handed back to callers:
//!
//! ```json
//! {"success": true, "records": [...], "metadata": {"totalRecords": 1, "query": "...", "filters": {}, "executedAt": "..."}}
//! {"success": false, "error": "...", "message": "...", "query": "...", "filters": {}}
//! ```

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::query::FilterSet;

/// Either a success or an error envelope.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum QueryOutcome {
    Success(QuerySuccess),
    Failure(QueryFailure),
}

impl QueryOutcome {
    /// Build a success envelope stamped with the current time.
    pub fn success(records: Vec<Value>, query: String, filters: Option<FilterSet>) -> Self {
        let metadata = QueryMetadata {
            total_records: records.len(),
            query,
            filters,
            executed_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        Self::Success(QuerySuccess {
            success: true,
            records,
            metadata,
        })
    }

    /// Build an error envelope.
    pub fn failure(
        error: impl Into<String>,
        message: impl Into<String>,
        query: Option<String>,
        filters: Option<FilterSet>,
    ) -> Self {
        Self::Failure(QueryFailure {
            success: false,
            error: error.into(),
            message: message.into(),
            query,
            filters,
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn as_success(&self) -> Option<&QuerySuccess> {
        match self {
            Self::Success(s) => Some(s),
            Self::Failure(_) => None,
        }
    }

    pub fn as_failure(&self) -> Option<&QueryFailure> {
        match self {
            Self::Failure(f) => Some(f),
            Self::Success(_) => None,
        }
    }
}

/// Successful execution: records plus metadata.
///
/// `metadata.totalRecords` is derived from the records at construction and
/// cannot disagree with them.
#[derive(Debug, Clone, Serialize)]
pub struct QuerySuccess {
    success: bool,
    records: Vec<Value>,
    metadata: QueryMetadata,
}

impl QuerySuccess {
    pub fn records(&self) -> &[Value] {
        &self.records
    }

    pub fn metadata(&self) -> &QueryMetadata {
        &self.metadata
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryMetadata {
    total_records: usize,
    query: String,
    /// Cleaned filters; absent for raw queries.
    #[serde(skip_serializing_if = "Option::is_none")]
    filters: Option<FilterSet>,
    /// ISO 8601 UTC timestamp with millisecond precision.
    executed_at: String,
}

impl QueryMetadata {
    pub fn total_records(&self) -> usize {
        self.total_records
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn filters(&self) -> Option<&FilterSet> {
        self.filters.as_ref()
    }

    pub fn executed_at(&self) -> &str {
        &self.executed_at
    }
}

/// Failed execution.
#[derive(Debug, Clone, Serialize)]
pub struct QueryFailure {
    success: bool,
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filters: Option<FilterSet>,
}

impl QueryFailure {
    /// Fixed summary of what failed.
    pub fn error(&self) -> &str {
        &self.error
    }

    /// Message of the underlying error.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Best-effort query text for diagnostics.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn filters(&self) -> Option<&FilterSet> {
        self.filters.as_ref()
    }
}
