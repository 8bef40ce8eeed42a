//! Data Cloud query assembly.
//!
//! This module provides:
//! - Escaping: SQL string literal sanitization for inline filter values
//! - Filters: cleaning of caller-supplied filter sets
//! - Params: query-string assembly for forwarded API calls
//! - Types: QueryDefinition, QuerySource, ColumnMap
//! - Definitions: the built-in unified B2B and engagement queries

mod definitions;
mod escape;
mod filters;
mod params;
mod types;
mod value;

pub use definitions::{
    ENGAGEMENT_COLUMNS, ENGAGEMENT_QUERY_NAME, QueryRegistry, ROW_LIMIT, UNIFIED_B2B_COLUMNS,
    UNIFIED_B2B_QUERY_NAME, build_unified_b2b_query, engagement_query, unified_b2b_base_sql,
    unified_b2b_query,
};
pub use escape::{escape_sql_string, escape_sql_value};
pub use filters::{clean_filters, is_supplied};
pub use params::build_query_params;
pub use types::{
    BuildFn, Column, ColumnMap, FilterSet, QueryDefinition, QuerySource, Record, Row, TransformFn,
};
pub use value::{coerce_to_string, is_truthy};
