use thiserror::Error;

/// Result alias for embedding operations
pub type Result<T> = std::result::Result<T, EmbeddingsError>;

/// Errors raised by the scoring oracle
#[derive(Debug, Error)]
pub enum EmbeddingsError {
    /// Failed to reach the embeddings provider
    #[error("connection error: {0}")]
    ConnectionError(String),

    /// Provider responded with a non-success status
    #[error("provider API error ({status}): {message}")]
    ProviderApiError { status: u16, message: String },

    /// Provider response could not be interpreted
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    /// Provider returned a vector of unexpected length
    #[error("expected {expected} dimensions, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}
