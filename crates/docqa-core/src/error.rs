//! Error taxonomy for the ingestion and answer pipelines.
//!
//! Backend traits ([`VectorStore`](crate::index::VectorStore),
//! [`EmbeddingProvider`](crate::embedding::EmbeddingProvider),
//! [`ChatModel`](crate::generation::ChatModel)) return `anyhow::Result`.
//! The pipeline maps their failures into this enum at component
//! boundaries so callers can tell a bad request from a downstream outage.

use thiserror::Error;

/// Result alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Empty payload or malformed caller input. Not retryable.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// File extension outside the supported set.
    #[error("unsupported file type: .{0}")]
    UnsupportedFormat(String),

    /// A supported file that could not be decoded.
    #[error("failed to decode '{filename}': {message}")]
    Decode { filename: String, message: String },

    /// Persisting vectors failed.
    #[error("index write failed: {0}")]
    IndexWrite(String),

    /// Embedding the question or querying the index failed.
    #[error("retrieval failed: {0}")]
    Retrieval(String),

    /// The chat model was unreachable or returned an error.
    #[error("generation failed: {0}")]
    Generation(String),

    /// An external capability did not answer in time.
    #[error("timed out after {0}s")]
    Timeout(u64),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn decode(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Machine-readable code used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidInput(_) => "invalid_input",
            Error::UnsupportedFormat(_) => "unsupported_format",
            Error::Decode { .. } => "decode_error",
            Error::IndexWrite(_) => "index_write_failure",
            Error::Retrieval(_) => "retrieval_failure",
            Error::Generation(_) => "generation_failure",
            Error::Timeout(_) => "timeout",
            Error::Internal(_) => "internal",
        }
    }

    /// True for errors caused by the request itself rather than a backend.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidInput(_) | Error::UnsupportedFormat(_) | Error::Decode { .. }
        )
    }
}
