//! Error types for query execution and authorization.
//!
//! Query-scoped failures ([`QueryError`]) are captured by the execution
//! service and folded into an error envelope. Authorization failures
//! ([`AuthorizationError`]) are infrastructural and propagate to the caller.

use thiserror::Error;

/// Errors raised while resolving, executing, or transforming a query.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The definition has no usable query text.
    #[error("query definition `{0}` must have either sql or buildQuery")]
    InvalidDefinition(String),

    /// The external query call failed (network, syntax, permission).
    #[error("{0}")]
    Execution(String),

    /// A result row could not be reshaped into a record.
    #[error("{0}")]
    Transform(String),
}

impl From<reqwest::Error> for QueryError {
    fn from(e: reqwest::Error) -> Self {
        QueryError::Execution(e.to_string())
    }
}

/// Errors raised while obtaining an authenticated context.
#[derive(Debug, Error)]
pub enum AuthorizationError {
    #[error("authorization request for `{connection}` failed: {source}")]
    Request {
        connection: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("authorization for `{connection}` rejected ({status}): {body}")]
    Rejected {
        connection: String,
        status: u16,
        body: String,
    },

    #[error("invalid authorization response for `{connection}`: {reason}")]
    InvalidResponse { connection: String, reason: String },
}

/// Result type alias using QueryError.
pub type QueryResult<T> = Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_error_displays_bare_message() {
        let err = QueryError::Execution("boom".to_string());
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn invalid_definition_names_the_definition() {
        let err = QueryError::InvalidDefinition("broken".to_string());
        assert_eq!(
            err.to_string(),
            "query definition `broken` must have either sql or buildQuery"
        );
    }

    #[test]
    fn rejected_authorization_includes_status() {
        let err = AuthorizationError::Rejected {
            connection: "datacloud_org".to_string(),
            status: 401,
            body: "invalid token".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "authorization for `datacloud_org` rejected (401): invalid token"
        );
    }
}
