//! Configuration error types

/// Errors raised while assembling a table.
///
/// These are fatal at setup: the engine is never built from an invalid
/// configuration, and they are reported once rather than retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// No column schema was supplied, or it was empty.
    #[error("Table requires a non-empty column schema")]
    MissingColumns,

    /// Neither a local dataset nor a fetch function was supplied.
    #[error("Table requires either a local dataset or a fetch function")]
    MissingDataSource,

    /// Both a local dataset and a fetch function were supplied.
    #[error("Table accepts a local dataset or a fetch function, not both")]
    ConflictingDataSource,

    /// Two columns share the same key.
    #[error("Column key '{key}' is declared more than once")]
    DuplicateColumn { key: String },

    /// A column key is not a valid dotted field path.
    #[error("Invalid field path '{path}'")]
    InvalidFieldPath { path: String },

    /// The requested page size is zero or outside the configured bounds.
    #[error("Page size {size} is outside the allowed range {min}..={max}")]
    InvalidPageSize { size: usize, min: usize, max: usize },
}

impl ConfigError {
    /// Creates a new duplicate column error.
    pub fn duplicate_column(key: impl Into<String>) -> Self {
        Self::DuplicateColumn { key: key.into() }
    }

    /// Creates a new invalid field path error.
    pub fn invalid_field_path(path: impl Into<String>) -> Self {
        Self::InvalidFieldPath { path: path.into() }
    }
}
