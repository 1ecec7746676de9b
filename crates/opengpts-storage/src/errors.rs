//! Error types for the storage subsystem.
//!
//! [`StoreError`] separates two failure classes callers treat differently:
//!
//! - **Transport**: the store could not be reached or rejected a command
//!   (`Sqlite`, `Pool`, `Redis`, `Io`, `Migration`). Surfaced unmodified, never retried.
//! - **Data integrity**: stored bytes could not be decoded, or a reply did not
//!   line up with the request (`Decode`, `FieldCount`, `WrongType`,
//!   `UnexpectedReply`). See [`StoreError::is_data_integrity`].

use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `SQLite` database error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Redis transport or command error.
    #[cfg(feature = "redis")]
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Schema migration failed.
    #[error("migration error: {message}")]
    Migration {
        /// Describes which migration failed and why.
        message: String,
    },

    /// Filesystem error preparing a database location.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Store URL could not be interpreted.
    #[error("invalid store url: {0}")]
    InvalidUrl(String),

    /// A value could not be serialized for writing.
    #[error("encode error: {0}")]
    Encode(serde_json::Error),

    /// Stored bytes could not be decoded.
    #[error("corrupt value in {context}: {source}")]
    Decode {
        /// Key or field the bad value came from.
        context: String,
        /// Underlying parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// Field names and raw values were not aligned.
    #[error("field count mismatch: expected {expected} values, got {actual}")]
    FieldCount {
        /// Number of requested fields.
        expected: usize,
        /// Number of values returned.
        actual: usize,
    },

    /// A key holds a different data type than the command expects.
    #[error("wrong type for key {key}: expected {expected}")]
    WrongType {
        /// Offending key.
        key: String,
        /// Type the command operates on.
        expected: &'static str,
    },

    /// The store returned a reply that does not match the command.
    #[error("unexpected reply: {0}")]
    UnexpectedReply(String),
}

impl StoreError {
    /// Whether the error means stored data is corrupt or misaligned, as
    /// opposed to the store being unreachable.
    pub fn is_data_integrity(&self) -> bool {
        matches!(
            self,
            Self::Decode { .. }
                | Self::FieldCount { .. }
                | Self::WrongType { .. }
                | Self::UnexpectedReply(_)
        )
    }

    pub(crate) fn decode(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            context: context.into(),
            source,
        }
    }
}

/// Convenience type alias for storage results.
pub type Result<T> = std::result::Result<T, StoreError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn json_err() -> serde_json::Error {
        serde_json::from_str::<String>("not json").unwrap_err()
    }

    #[test]
    fn sqlite_error_display() {
        let err = StoreError::Sqlite(rusqlite::Error::QueryReturnedNoRows);
        assert!(err.to_string().contains("sqlite error"));
        assert!(!err.is_data_integrity());
    }

    #[test]
    fn migration_error_display() {
        let err = StoreError::Migration {
            message: "v001 failed: table already exists".into(),
        };
        assert_eq!(
            err.to_string(),
            "migration error: v001 failed: table already exists"
        );
    }

    #[test]
    fn decode_error_names_context() {
        let err = StoreError::decode("opengpts:1:assistant:a/config", json_err());
        assert!(err.to_string().starts_with("corrupt value in opengpts:1:assistant:a/config"));
        assert!(err.is_data_integrity());
    }

    #[test]
    fn field_count_display() {
        let err = StoreError::FieldCount {
            expected: 4,
            actual: 3,
        };
        assert_eq!(
            err.to_string(),
            "field count mismatch: expected 4 values, got 3"
        );
        assert!(err.is_data_integrity());
    }

    #[test]
    fn wrong_type_display() {
        let err = StoreError::WrongType {
            key: "k".into(),
            expected: "set",
        };
        assert_eq!(err.to_string(), "wrong type for key k: expected set");
    }

    #[test]
    fn transport_errors_are_not_integrity_errors() {
        assert!(!StoreError::InvalidUrl("ftp://x".into()).is_data_integrity());
        assert!(!StoreError::Encode(json_err()).is_data_integrity());
    }

    #[test]
    fn from_rusqlite_error() {
        let err: StoreError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, StoreError::Sqlite(_)));
    }
}
