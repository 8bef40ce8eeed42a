//! Built-in Data Cloud query definitions.
//!
//! - `unified-b2b`: unified accounts, filterable by name, source and segment
//! - `engagement`: recent website engagement events, no filters

use std::sync::{Arc, LazyLock};

use super::escape::escape_sql_value;
use super::types::{Column, ColumnMap, FilterSet, QueryDefinition, QuerySource};
use super::value::is_truthy;

/// Row cap applied to every built-in query.
pub const ROW_LIMIT: u32 = 100;

pub const UNIFIED_B2B_QUERY_NAME: &str = "unified-b2b";
pub const ENGAGEMENT_QUERY_NAME: &str = "engagement";

const UNIFIED_ACCOUNT_TABLE: &str = "ssot__Account__dlm";

/// Unified account columns in SELECT order.
pub const UNIFIED_B2B_COLUMNS: ColumnMap = ColumnMap::new(&[
    Column::new("ssot__Name__c", "name"),
    Column::new("ssot__AccountNumber__c", "number"),
    Column::new("ssot__AccountSource__c", "accountSource"),
    Column::new("ssot__AccountTypeId__c", "accountTypeId"),
    Column::new("ssot__CreatedDate__c", "createdDate"),
    Column::new("ssot__LastModifiedDate__c", "lastModifiedDate"),
    Column::new("ssot__ParentAccountId__c", "parentAccountId"),
    Column::new("ssot__Id__c", "id"),
]);

const ENGAGEMENT_TABLE: &str = "ssot__WebsiteEngagement__dlm";

/// Website engagement columns in SELECT order.
pub const ENGAGEMENT_COLUMNS: ColumnMap = ColumnMap::new(&[
    Column::new("ssot__ClientSessionId__c", "clientSession"),
    Column::new("ssot__CreatedDate__c", "createdDate"),
    Column::new("ssot__EntityType__c", "entityType"),
    Column::new("ssot__Id__c", "eventIdentifier"),
    Column::new("ssot__EventName__c", "eventName"),
]);

/// How a filter value is compared against its column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterMatch {
    /// Substring match via `LIKE '%value%'`.
    Contains,
    /// Exact match.
    Equals,
}

/// Unified B2B filters, in the order their conditions are emitted.
const UNIFIED_B2B_FILTERS: &[(&str, &str, FilterMatch)] = &[
    ("accountName", "ssot__Name__c", FilterMatch::Contains),
    ("accountSource", "ssot__AccountSource__c", FilterMatch::Equals),
    ("segment", "ssot__AccountTypeId__c", FilterMatch::Equals),
];

static UNIFIED_B2B_BASE_SQL: LazyLock<String> = LazyLock::new(|| {
    format!(
        "SELECT {} FROM {UNIFIED_ACCOUNT_TABLE}",
        UNIFIED_B2B_COLUMNS.select_list()
    )
});

static UNIFIED_B2B_QUERY: LazyLock<QueryDefinition> = LazyLock::new(|| {
    QueryDefinition::with_columns(
        UNIFIED_B2B_QUERY_NAME,
        QuerySource::Dynamic(Arc::new(build_unified_b2b_query)),
        UNIFIED_B2B_COLUMNS,
    )
});

static ENGAGEMENT_QUERY: LazyLock<QueryDefinition> = LazyLock::new(|| {
    QueryDefinition::with_columns(
        ENGAGEMENT_QUERY_NAME,
        QuerySource::Static(format!(
            "SELECT {} FROM {ENGAGEMENT_TABLE} LIMIT {ROW_LIMIT}",
            ENGAGEMENT_COLUMNS.select_list()
        )),
        ENGAGEMENT_COLUMNS,
    )
});

/// The unified account SELECT ... FROM clause, without WHERE or LIMIT.
pub fn unified_b2b_base_sql() -> &'static str {
    &UNIFIED_B2B_BASE_SQL
}

/// Build the unified account query for a cleaned filter set.
///
/// Falsy filter values are skipped. Present conditions are joined with
/// `AND` in fixed order; the row limit is always appended.
pub fn build_unified_b2b_query(filters: Option<&FilterSet>) -> String {
    let conditions: Vec<String> = filters
        .map(|filters| {
            UNIFIED_B2B_FILTERS
                .iter()
                .filter_map(|(key, column, matching)| {
                    let value = filters.get(*key).filter(|v| is_truthy(v))?;
                    let escaped = escape_sql_value(value);
                    Some(match matching {
                        FilterMatch::Contains => format!("{column} LIKE '%{escaped}%'"),
                        FilterMatch::Equals => format!("{column} = '{escaped}'"),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let mut sql = unified_b2b_base_sql().to_string();
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
    sql.push_str(&format!(" LIMIT {ROW_LIMIT}"));
    sql
}

/// Unified B2B account query.
pub fn unified_b2b_query() -> &'static QueryDefinition {
    &UNIFIED_B2B_QUERY
}

/// Website engagement query.
pub fn engagement_query() -> &'static QueryDefinition {
    &ENGAGEMENT_QUERY
}

/// Lookup of built-in definitions by name.
#[derive(Debug, Clone)]
pub struct QueryRegistry {
    definitions: Vec<&'static QueryDefinition>,
}

impl QueryRegistry {
    /// Registry holding every built-in definition.
    pub fn builtin() -> Self {
        Self {
            definitions: vec![unified_b2b_query(), engagement_query()],
        }
    }

    pub fn get(&self, name: &str) -> Option<&'static QueryDefinition> {
        self.definitions.iter().copied().find(|d| d.name() == name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.definitions
            .iter()
            .copied()
            .map(QueryDefinition::name)
            .collect()
    }
}

impl Default for QueryRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
