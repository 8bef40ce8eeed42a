//! Data Cloud Kernel Library
//!
//! Query assembly, AppLink authorization and request-scoped query execution
//! for Salesforce Data Cloud. The `datacloud` binary is a thin command-line
//! front end over this library.

pub mod config;
pub mod datacloud;
pub mod error;
pub mod query;
pub mod services;

pub use config::Config;
pub use datacloud::{AppLinkClient, Authorizer, DataCloudContext, QueryResponse};
pub use error::{AuthorizationError, QueryError, QueryResult};
pub use services::{QueryExecutionService, QueryOutcome};
