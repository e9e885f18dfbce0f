use thiserror::Error;

/// Validation errors raised when a row does not fit its table schema
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Type mismatch in column {column}: expected {expected}, got {actual}")]
    TypeMismatch {
        column: String,
        expected: String,
        actual: String,
    },
    #[error("NULL value not allowed for non-nullable column {0}")]
    NullValueNotAllowed(String),
    #[error("Column not found: {0}")]
    ColumnNotFound(String),
    #[error("Missing value for column {0}")]
    MissingColumn(String),
}

/// Type validation result
pub type ValidationResult<T> = Result<T, ValidationError>;
