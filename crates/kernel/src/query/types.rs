//! Query definition types.
//!
//! Provides the declarative pieces the execution service works with:
//! - FilterSet / Row / Record: the data shapes flowing through a query
//! - QuerySource: static text or a filter-driven builder
//! - ColumnMap: one ordered column list driving both SELECT and transform
//! - QueryDefinition: source + transform, shared read-only

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::{QueryError, QueryResult};

/// Caller-supplied filters keyed by name, in insertion order.
pub type FilterSet = Map<String, Value>;

/// A positional result row, ordered like the SELECT list.
pub type Row = Vec<Value>;

/// A named-field record.
pub type Record = Map<String, Value>;

/// Produces query text from an optional filter set.
pub type BuildFn = Arc<dyn Fn(Option<&FilterSet>) -> String + Send + Sync>;

/// Reshapes positional rows into output records.
pub type TransformFn = Arc<dyn Fn(Vec<Row>) -> QueryResult<Vec<Value>> + Send + Sync>;

/// Where a definition's query text comes from.
#[derive(Clone)]
pub enum QuerySource {
    /// Fixed text; filters are ignored.
    Static(String),
    /// Text assembled from the filter set.
    Dynamic(BuildFn),
}

impl QuerySource {
    /// Resolve to SQL text.
    ///
    /// Blank static text is treated as a definition with no query at all.
    fn resolve(&self, name: &str, filters: Option<&FilterSet>) -> QueryResult<String> {
        match self {
            Self::Dynamic(build) => Ok(build(filters)),
            Self::Static(sql) if sql.trim().is_empty() => {
                Err(QueryError::InvalidDefinition(name.to_string()))
            }
            Self::Static(sql) => Ok(sql.clone()),
        }
    }
}

impl fmt::Debug for QuerySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(sql) => f.debug_tuple("Static").field(sql).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// A SQL column and the record field it lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub sql: &'static str,
    pub field: &'static str,
}

impl Column {
    pub const fn new(sql: &'static str, field: &'static str) -> Self {
        Self { sql, field }
    }
}

/// Ordered column list shared by the SELECT clause and the row transform,
/// so the two cannot drift apart.
#[derive(Debug, Clone, Copy)]
pub struct ColumnMap {
    columns: &'static [Column],
}

impl ColumnMap {
    pub const fn new(columns: &'static [Column]) -> Self {
        Self { columns }
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Comma-separated SQL column list for a SELECT clause.
    pub fn select_list(&self) -> String {
        self.columns
            .iter()
            .map(|c| c.sql)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Record field names in column order.
    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|c| c.field)
    }

    /// Map positional rows to records, one for one and in order.
    ///
    /// A row whose width differs from the column count is an error rather
    /// than a silently misaligned record.
    pub fn to_records(&self, rows: Vec<Row>) -> QueryResult<Vec<Value>> {
        rows.into_iter()
            .enumerate()
            .map(|(index, row)| {
                if row.len() != self.columns.len() {
                    return Err(QueryError::Transform(format!(
                        "row {index}: expected {} columns, got {}",
                        self.columns.len(),
                        row.len()
                    )));
                }
                let record: Record = self.fields().map(str::to_string).zip(row).collect();
                Ok(Value::Object(record))
            })
            .collect()
    }
}

/// An immutable pairing of query text and row transform.
///
/// Definitions are built once and shared read-only across requests.
#[derive(Clone)]
pub struct QueryDefinition {
    name: String,
    source: QuerySource,
    transform: TransformFn,
}

impl QueryDefinition {
    /// Create a definition from a source and a custom transform.
    pub fn new(name: impl Into<String>, source: QuerySource, transform: TransformFn) -> Self {
        Self {
            name: name.into(),
            source,
            transform,
        }
    }

    /// Create a definition whose records are named by a column map.
    pub fn with_columns(name: impl Into<String>, source: QuerySource, columns: ColumnMap) -> Self {
        Self::new(name, source, Arc::new(move |rows: Vec<Row>| columns.to_records(rows)))
    }

    /// Assemble a definition from optional parts.
    ///
    /// A builder takes priority over fixed text; having neither is an error.
    pub fn from_parts(
        name: impl Into<String>,
        sql: Option<String>,
        build: Option<BuildFn>,
        transform: TransformFn,
    ) -> QueryResult<Self> {
        let name = name.into();
        let source = match (build, sql) {
            (Some(build), _) => QuerySource::Dynamic(build),
            (None, Some(sql)) => QuerySource::Static(sql),
            (None, None) => return Err(QueryError::InvalidDefinition(name)),
        };
        Ok(Self::new(name, source, transform))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &QuerySource {
        &self.source
    }

    /// Resolve the SQL to run for the given filters.
    ///
    /// `None` yields the unfiltered query, used when reporting what would
    /// have run after a failure.
    pub fn resolve(&self, filters: Option<&FilterSet>) -> QueryResult<String> {
        self.source.resolve(&self.name, filters)
    }

    /// Apply the row transform.
    pub fn transform(&self, rows: Vec<Row>) -> QueryResult<Vec<Value>> {
        (self.transform)(rows)
    }
}

impl fmt::Debug for QueryDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryDefinition")
            .field("name", &self.name)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}
