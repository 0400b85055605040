//! Remote fetch error types

/// Errors returned by a remote fetch function.
///
/// The engine does not retry on any of these. The previously published page
/// stays in place and the next trigger fetches again.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The fetch function rejected the request.
    #[error("Fetch rejected: {message}")]
    Rejected { message: String },

    /// The fetch function resolved with a response the engine cannot use.
    #[error("Invalid fetch response: {message}")]
    InvalidResponse { message: String },

    /// The underlying transport failed.
    #[error("Transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl FetchError {
    /// Creates a new rejection error.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    /// Creates a new invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// Wraps a transport-level error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Box::new(err))
    }
}
