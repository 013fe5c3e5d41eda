//! Pipeline error type
//!
//! Safety rejections and empty model answers are not errors; they are ordinary
//! responses. This type covers the failures that abort a request.

use thiserror::Error;

use crate::db::DbError;
use crate::llm::LlmError;

/// Errors that abort the query pipeline
#[derive(Error, Debug)]
pub enum QueryError {
    /// Introspecting a validated table failed; partial schema is discarded
    #[error("Schema error for '{table}': {source}")]
    Schema {
        table: String,
        #[source]
        source: DbError,
    },

    /// The chat-completion call failed
    #[error(transparent)]
    Llm(#[from] LlmError),

    /// Connection setup or statement execution failed
    #[error(transparent)]
    Database(#[from] DbError),
}

impl QueryError {
    /// Whether the failure came from the model provider's transport
    pub fn is_provider_error(&self) -> bool {
        matches!(self, QueryError::Llm(e) if e.is_provider_error())
    }
}

/// Result type alias for pipeline stages
pub type QueryResult<T> = Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_names_table() {
        let err = QueryError::Schema {
            table: "orders".to_string(),
            source: DbError::InvalidConnection("gone".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Schema error for 'orders': Invalid connection: gone"
        );
        assert!(!err.is_provider_error());
    }

    #[test]
    fn test_provider_error_passthrough() {
        let err = QueryError::from(LlmError::Status {
            status: reqwest::StatusCode::TOO_MANY_REQUESTS,
            body: "rate limited".to_string(),
        });
        assert!(err.is_provider_error());
        assert_eq!(err.to_string(), "rate limited");

        assert!(!QueryError::from(LlmError::MissingApiKey).is_provider_error());
    }
}
