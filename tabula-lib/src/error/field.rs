//! FieldError for column key resolution

/// Error type for resolving a column key path against a row.
///
/// Raised per cell. A failed cell renders as a placeholder; the rest of the
/// table is unaffected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    /// A segment of the path is absent from the row.
    #[error("Field '{path}' not found: missing segment '{segment}'")]
    NotFound { path: String, segment: String },

    /// A segment addresses a value that has no nested fields.
    #[error("Field '{path}' not traversable at '{segment}': found {found}")]
    NotTraversable {
        path: String,
        segment: String,
        found: &'static str,
    },
}

impl FieldError {
    /// Creates a new not-found error.
    pub fn not_found(path: impl Into<String>, segment: impl Into<String>) -> Self {
        Self::NotFound {
            path: path.into(),
            segment: segment.into(),
        }
    }

    /// Creates a new not-traversable error.
    pub fn not_traversable(
        path: impl Into<String>,
        segment: impl Into<String>,
        found: &'static str,
    ) -> Self {
        Self::NotTraversable {
            path: path.into(),
            segment: segment.into(),
            found,
        }
    }

    /// Returns the full path that failed to resolve.
    pub fn path(&self) -> &str {
        match self {
            Self::NotFound { path, .. } | Self::NotTraversable { path, .. } => path,
        }
    }
}
