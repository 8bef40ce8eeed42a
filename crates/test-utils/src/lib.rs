//! Data Cloud test utilities.
//!
//! Stub collaborators for integration testing: an authorizer that counts its
//! calls and a context that returns canned rows or fails on demand.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use datacloud_kernel::query::{FilterSet, Row};
use datacloud_kernel::{
    AuthorizationError, DataCloudContext, QueryError, QueryResponse, QueryResult,
};
use parking_lot::Mutex;
use serde_json::Value as JsonValue;

/// Build a filter set from a JSON object literal.
///
/// Non-object values give an empty set.
pub fn filter_set(value: JsonValue) -> FilterSet {
    match value {
        JsonValue::Object(map) => map,
        _ => FilterSet::new(),
    }
}

/// Build positional rows from string cells.
pub fn string_rows(rows: &[&[&str]]) -> Vec<Row> {
    rows.iter()
        .map(|row| row.iter().map(|cell| JsonValue::from(*cell)).collect())
        .collect()
}

#[derive(Debug, Clone)]
enum StubReply {
    Rows(Vec<Row>),
    Missing,
    Fail(String),
}

/// A canned [`DataCloudContext`].
///
/// Records every SQL string and core resource it receives.
#[derive(Debug)]
pub struct StubContext {
    reply: StubReply,
    core_body: JsonValue,
    queries: Mutex<Vec<String>>,
    resources: Mutex<Vec<String>>,
}

impl StubContext {
    fn with_reply(reply: StubReply) -> Self {
        Self {
            reply,
            core_body: JsonValue::Null,
            queries: Mutex::new(Vec::new()),
            resources: Mutex::new(Vec::new()),
        }
    }

    /// Queries resolve to `{data: rows}`.
    pub fn with_rows(rows: Vec<Row>) -> Self {
        Self::with_reply(StubReply::Rows(rows))
    }

    /// Queries resolve to a body with no `data` key.
    pub fn without_data() -> Self {
        Self::with_reply(StubReply::Missing)
    }

    /// Queries and core requests fail with `message`.
    pub fn failing(message: &str) -> Self {
        Self::with_reply(StubReply::Fail(message.to_string()))
    }

    /// Set the body returned by core REST requests.
    pub fn with_core_body(mut self, body: JsonValue) -> Self {
        self.core_body = body;
        self
    }

    /// SQL strings received, in order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }

    /// Core resources requested, in order.
    pub fn resources(&self) -> Vec<String> {
        self.resources.lock().clone()
    }
}

#[async_trait]
impl DataCloudContext for StubContext {
    async fn query(&self, sql: &str) -> QueryResult<QueryResponse> {
        self.queries.lock().push(sql.to_string());
        match &self.reply {
            StubReply::Rows(rows) => Ok(QueryResponse::new(rows.clone())),
            StubReply::Missing => Ok(QueryResponse::default()),
            StubReply::Fail(message) => Err(QueryError::Execution(message.clone())),
        }
    }

    async fn core_get(&self, resource: &str) -> QueryResult<JsonValue> {
        self.resources.lock().push(resource.to_string());
        match &self.reply {
            StubReply::Fail(message) => Err(QueryError::Execution(message.clone())),
            _ => Ok(self.core_body.clone()),
        }
    }
}

/// A [`datacloud_kernel::Authorizer`] that hands out one shared stub context,
/// or rejects every call.
#[derive(Debug)]
pub struct StubAuthorizer {
    context: Option<Arc<StubContext>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    connections: Mutex<Vec<String>>,
}

impl StubAuthorizer {
    /// Grant `context` on every call.
    pub fn granting(context: Arc<StubContext>) -> Self {
        Self {
            context: Some(context),
            delay: None,
            calls: AtomicUsize::new(0),
            connections: Mutex::new(Vec::new()),
        }
    }

    /// Reject every call with a 401.
    pub fn rejecting() -> Self {
        Self {
            context: None,
            delay: None,
            calls: AtomicUsize::new(0),
            connections: Mutex::new(Vec::new()),
        }
    }

    /// Sleep before answering, widening the window for concurrent callers.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of authorize calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Connection names requested, in order.
    pub fn connections(&self) -> Vec<String> {
        self.connections.lock().clone()
    }
}

#[async_trait]
impl datacloud_kernel::Authorizer for StubAuthorizer {
    async fn authorize(
        &self,
        connection_name: &str,
    ) -> Result<Arc<dyn DataCloudContext>, AuthorizationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.connections.lock().push(connection_name.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.context {
            Some(context) => Ok(context.clone()),
            None => Err(AuthorizationError::Rejected {
                connection: connection_name.to_string(),
                status: 401,
                body: "invalid token".to_string(),
            }),
        }
    }
}
