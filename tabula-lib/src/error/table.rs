//! Top-level engine error

use super::ConfigError;
use super::FetchError;

/// Errors returned by [`TableEngine`](crate::TableEngine) operations.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The remote fetch failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl TableError {
    /// Returns `true` if this is a fetch failure.
    pub fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch(_))
    }
}
