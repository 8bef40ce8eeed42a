//! Kernel services.
//!
//! Request-scoped execution of Data Cloud queries and the response
//! envelopes they produce.

pub mod envelope;
pub mod query_execution;

pub use envelope::{QueryFailure, QueryMetadata, QueryOutcome, QuerySuccess};
pub use query_execution::{MODELS_FAILED, QUERY_BUILD_FAILED, QUERY_FAILED, QueryExecutionService};
