//! Data Cloud query execution service.
//!
//! One service instance serves one logical request. It authorizes the
//! configured connection on first use, caches the resulting context, and
//! turns every query-scoped failure into an error envelope. Authorization
//! failures are not query-scoped and propagate to the caller instead.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::envelope::QueryOutcome;
use crate::datacloud::{Authorizer, DataCloudContext};
use crate::error::{AuthorizationError, QueryResult};
use crate::query::{FilterSet, QueryDefinition, Row, build_query_params, clean_filters};

/// Error summary for failed Data Cloud queries.
pub const QUERY_FAILED: &str = "Failed to execute Data Cloud query";

/// Error summary for failed data model lookups.
pub const MODELS_FAILED: &str = "Failed to fetch data model objects";

/// Fallback query text when even the unfiltered query cannot be resolved.
pub const QUERY_BUILD_FAILED: &str = "Query build failed";

/// Core REST resource listing Data Cloud data model objects.
const DATA_MODEL_OBJECTS_RESOURCE: &str = "ssot/data-model-objects";

/// Request-scoped query executor with a lazily authorized context.
pub struct QueryExecutionService {
    authorizer: Arc<dyn Authorizer>,
    connection_name: String,
    request_id: Uuid,
    /// Filled at most once; concurrent first callers share one authorize call.
    context: OnceCell<Arc<dyn DataCloudContext>>,
}

impl QueryExecutionService {
    /// Create a service for one logical request.
    pub fn new(authorizer: Arc<dyn Authorizer>, connection_name: impl Into<String>) -> Self {
        Self {
            authorizer,
            connection_name: connection_name.into(),
            request_id: Uuid::now_v7(),
            context: OnceCell::new(),
        }
    }

    pub fn connection_name(&self) -> &str {
        &self.connection_name
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Get the authenticated context, authorizing on first use.
    ///
    /// A failed authorization leaves the cache empty, so a later call tries
    /// again; nothing retries within a single call.
    pub async fn context(&self) -> Result<Arc<dyn DataCloudContext>, AuthorizationError> {
        self.context
            .get_or_try_init(|| async {
                debug!(
                    request_id = %self.request_id,
                    connection = %self.connection_name,
                    "authorizing connection"
                );
                self.authorizer.authorize(&self.connection_name).await
            })
            .await
            .map(Arc::clone)
    }

    /// Execute a definition with already-cleaned filters.
    pub async fn execute_query(
        &self,
        definition: &QueryDefinition,
        filters: FilterSet,
    ) -> Result<QueryOutcome, AuthorizationError> {
        let context = self.context().await?;

        match self.run_definition(context.as_ref(), definition, &filters).await {
            Ok((sql, records)) => Ok(QueryOutcome::success(records, sql, Some(filters))),
            Err(e) => {
                error!(
                    request_id = %self.request_id,
                    definition = definition.name(),
                    error = %e,
                    "Data Cloud query failed"
                );
                let fallback = definition
                    .resolve(None)
                    .unwrap_or_else(|_| QUERY_BUILD_FAILED.to_string());
                Ok(QueryOutcome::failure(
                    QUERY_FAILED,
                    e.to_string(),
                    Some(fallback),
                    Some(filters),
                ))
            }
        }
    }

    /// Clean caller-supplied filters, then execute the definition.
    pub async fn execute_query_with_filters(
        &self,
        definition: &QueryDefinition,
        raw_filters: &FilterSet,
    ) -> Result<QueryOutcome, AuthorizationError> {
        self.execute_query(definition, clean_filters(raw_filters))
            .await
    }

    /// Execute literal SQL, returning rows as positional arrays.
    pub async fn execute_raw_query(&self, sql: &str) -> Result<QueryOutcome, AuthorizationError> {
        self.execute_raw_query_with(sql, |rows| {
            Ok(rows.into_iter().map(Value::Array).collect())
        })
        .await
    }

    /// Execute literal SQL and reshape the rows with `transform`.
    pub async fn execute_raw_query_with<F>(
        &self,
        sql: &str,
        transform: F,
    ) -> Result<QueryOutcome, AuthorizationError>
    where
        F: FnOnce(Vec<Row>) -> QueryResult<Vec<Value>> + Send,
    {
        let context = self.context().await?;

        info!(request_id = %self.request_id, query = %sql, "executing raw Data Cloud query");
        let result = context
            .query(sql)
            .await
            .and_then(|response| transform(response.into_rows()));

        match result {
            Ok(records) => Ok(QueryOutcome::success(records, sql.to_string(), None)),
            Err(e) => {
                error!(request_id = %self.request_id, error = %e, "raw Data Cloud query failed");
                Ok(QueryOutcome::failure(
                    QUERY_FAILED,
                    e.to_string(),
                    Some(sql.to_string()),
                    None,
                ))
            }
        }
    }

    /// Forward a data model object lookup to the core REST API.
    ///
    /// Records are the response's `dataModelObject` entries when present,
    /// otherwise the whole body.
    pub async fn list_data_models(
        &self,
        raw_params: &FilterSet,
    ) -> Result<QueryOutcome, AuthorizationError> {
        let context = self.context().await?;
        let params = clean_filters(raw_params);

        let query_string = build_query_params(&params, &[]);
        let resource = if query_string.is_empty() {
            DATA_MODEL_OBJECTS_RESOURCE.to_string()
        } else {
            format!("{DATA_MODEL_OBJECTS_RESOURCE}?{query_string}")
        };

        info!(request_id = %self.request_id, resource = %resource, "fetching data model objects");
        match context.core_get(&resource).await {
            Ok(body) => {
                let records = model_records(body);
                Ok(QueryOutcome::success(records, resource, Some(params)))
            }
            Err(e) => {
                error!(request_id = %self.request_id, error = %e, "data model lookup failed");
                Ok(QueryOutcome::failure(
                    MODELS_FAILED,
                    e.to_string(),
                    Some(resource),
                    Some(params),
                ))
            }
        }
    }

    async fn run_definition(
        &self,
        context: &dyn DataCloudContext,
        definition: &QueryDefinition,
        filters: &FilterSet,
    ) -> QueryResult<(String, Vec<Value>)> {
        let sql = definition.resolve(Some(filters))?;
        info!(
            request_id = %self.request_id,
            definition = definition.name(),
            query = %sql,
            "executing Data Cloud query"
        );

        let rows = context.query(&sql).await?.into_rows();
        let records = definition.transform(rows)?;
        Ok((sql, records))
    }
}

/// Unwrap the `dataModelObject` list from a lookup response.
fn model_records(body: Value) -> Vec<Value> {
    match body {
        Value::Object(mut map) => match map
            .get_mut("dataModelObject")
            .and_then(Value::as_array_mut)
        {
            Some(objects) => std::mem::take(objects),
            None => vec![Value::Object(map)],
        },
        Value::Array(items) => items,
        other => vec![other],
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::datacloud::QueryResponse;
    use crate::query::QuerySource;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedContext;

    #[async_trait]
    impl DataCloudContext for FixedContext {
        async fn query(&self, _sql: &str) -> QueryResult<QueryResponse> {
            Ok(QueryResponse::new(vec![vec![json!("A")]]))
        }

        async fn core_get(&self, resource: &str) -> QueryResult<Value> {
            Ok(json!({"resource": resource}))
        }
    }

    #[derive(Default)]
    struct CountingAuthorizer {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Authorizer for CountingAuthorizer {
        async fn authorize(
            &self,
            _connection_name: &str,
        ) -> Result<Arc<dyn DataCloudContext>, AuthorizationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(FixedContext))
        }
    }

    fn service() -> (Arc<CountingAuthorizer>, QueryExecutionService) {
        let authorizer = Arc::new(CountingAuthorizer::default());
        let service = QueryExecutionService::new(authorizer.clone(), "datacloud_org");
        (authorizer, service)
    }

    #[tokio::test]
    async fn context_is_cached() {
        let (authorizer, service) = service();
        service.context().await.unwrap();
        service.context().await.unwrap();
        assert_eq!(authorizer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn blank_definition_reports_build_failure() {
        let (_, service) = service();
        let def = QueryDefinition::new(
            "blank",
            QuerySource::Static(String::new()),
            Arc::new(|rows: Vec<Row>| -> QueryResult<Vec<Value>> {
                Ok(rows.into_iter().map(Value::Array).collect())
            }),
        );

        let outcome = service.execute_query(&def, FilterSet::new()).await.unwrap();
        let failure = outcome.as_failure().unwrap();

        assert_eq!(failure.error(), QUERY_FAILED);
        assert_eq!(
            failure.message(),
            "query definition `blank` must have either sql or buildQuery"
        );
        assert_eq!(failure.query(), Some(QUERY_BUILD_FAILED));
    }

    #[tokio::test]
    async fn models_without_params_hit_bare_resource() {
        let (_, service) = service();
        let outcome = service.list_data_models(&FilterSet::new()).await.unwrap();
        let success = outcome.as_success().unwrap();

        assert_eq!(success.metadata().query(), "ssot/data-model-objects");
        assert_eq!(
            success.records(),
            [json!({"resource": "ssot/data-model-objects"})]
        );
    }

    #[test]
    fn model_records_unwraps_object_list() {
        assert_eq!(
            model_records(json!({
                "dataModelObject": [{"name": "a"}, {"name": "b"}],
                "totalSize": 2,
            })),
            [json!({"name": "a"}), json!({"name": "b"})]
        );
        assert_eq!(
            model_records(json!({"dataModelObject": "odd"})),
            [json!({"dataModelObject": "odd"})]
        );
        assert_eq!(model_records(json!([1, 2])), [json!(1), json!(2)]);
    }

    #[test]
    fn request_ids_are_unique_per_instance() {
        let (_, a) = service();
        let (_, b) = service();
        assert_ne!(a.request_id(), b.request_id());
        assert_eq!(a.connection_name(), "datacloud_org");
    }
}
