//! Error types for pginsert

use thiserror::Error;

/// Result type alias for pginsert operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for schema building, statement compilation and execution
#[derive(Debug, Error)]
pub enum OrmError {
    /// A row's record type disagrees with the query's target type
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// A field value that no formatter knows how to render
    #[error("Unsupported value in column '{column}': {message}")]
    UnsupportedValue { column: String, message: String },

    /// A clause override that the statement shape requires is missing or unusable
    #[error("Invalid override: {0}")]
    InvalidOverride(String),

    /// A record descriptor that cannot be flattened into a table model
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// Query execution error
    #[cfg(feature = "postgres")]
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl OrmError {
    /// Create a type mismatch error
    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create an unsupported value error for a specific column
    pub fn unsupported_value(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnsupportedValue {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create an invalid override error
    pub fn invalid_override(message: impl Into<String>) -> Self {
        Self::InvalidOverride(message.into())
    }

    /// Create an invalid schema error
    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Self::InvalidSchema(message.into())
    }

    /// Check if this is a type mismatch error
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, Self::TypeMismatch { .. })
    }

    /// Check if this is an unsupported value error
    pub fn is_unsupported_value(&self) -> bool {
        matches!(self, Self::UnsupportedValue { .. })
    }

    /// Check if this is an invalid override error
    pub fn is_invalid_override(&self) -> bool {
        matches!(self, Self::InvalidOverride(_))
    }

    /// Check if this is an invalid schema error
    pub fn is_invalid_schema(&self) -> bool {
        matches!(self, Self::InvalidSchema(_))
    }
}
