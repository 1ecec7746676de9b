//! Ingestion error types.

use thiserror::Error;

/// Errors from splitting, embedding or indexing documents.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Missing or invalid configuration, including unbound runtime values.
    #[error("config error: {0}")]
    Config(String),

    /// HTTP transport error talking to the embeddings API.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The embeddings API answered with an error status.
    #[error("embeddings API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body or error message.
        message: String,
    },

    /// The embeddings API returned a different number of vectors than inputs.
    #[error("expected {expected} embeddings, got {actual}")]
    EmbeddingCount {
        /// Number of input texts.
        expected: usize,
        /// Number of vectors returned.
        actual: usize,
    },

    /// `SQLite` error in the vector store.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// JSON (de)serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn error_display_variants() {
        let cases = vec![
            (
                IngestError::Config("user_id is not bound".into()),
                "config error: user_id is not bound",
            ),
            (
                IngestError::Api {
                    status: 429,
                    message: "rate limited".into(),
                },
                "embeddings API error (429): rate limited",
            ),
            (
                IngestError::EmbeddingCount {
                    expected: 3,
                    actual: 2,
                },
                "expected 3 embeddings, got 2",
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.to_string(), expected);
        }
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<IngestError>();
    }

    #[test]
    fn sqlite_source_chain_preserved() {
        let err: IngestError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, IngestError::Sqlite(_)));
        assert!(err.source().is_some());
    }
}
