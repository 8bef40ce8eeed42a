//! Data Cloud access seams.
//!
//! The execution service only needs two capabilities from its environment:
//! an [`Authorizer`] that exchanges a connection name for an authenticated
//! [`DataCloudContext`], and the context's ability to run SQL. The AppLink
//! implementation lives in [`applink`]; tests supply stubs.

pub mod applink;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AuthorizationError, QueryResult};
use crate::query::Row;

pub use applink::AppLinkClient;

/// Response body of a Data Cloud query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Positional rows in SELECT order. Missing or null means no rows.
    #[serde(default)]
    data: Option<Vec<Row>>,
}

impl QueryResponse {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { data: Some(rows) }
    }

    /// Consume the response, yielding its rows.
    pub fn into_rows(self) -> Vec<Row> {
        self.data.unwrap_or_default()
    }
}

/// An authenticated handle to Data Cloud and the org's core REST API.
#[async_trait]
pub trait DataCloudContext: Send + Sync {
    /// Execute a SQL query against Data Cloud.
    async fn query(&self, sql: &str) -> QueryResult<QueryResponse>;

    /// GET a resource relative to the org's versioned REST root
    /// (`/services/data/vXX.X/`) and return the JSON body.
    async fn core_get(&self, resource: &str) -> QueryResult<serde_json::Value>;
}

/// Exchanges a connection name for an authenticated context.
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn authorize(
        &self,
        connection_name: &str,
    ) -> Result<Arc<dyn DataCloudContext>, AuthorizationError>;
}
