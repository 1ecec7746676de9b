//! Settings error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file exists but could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        /// Settings file path.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The settings file, or the merged settings, are not valid JSON for
    /// [`OpenGptsSettings`](crate::OpenGptsSettings).
    #[error("malformed settings: {0}")]
    Json(#[from] serde_json::Error),
    /// A value failed validation.
    #[error("invalid settings value: {0}")]
    InvalidValue(String),
}

/// Result alias for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_error_names_the_file() {
        let err = SettingsError::Read {
            path: PathBuf::from("/etc/opengpts/settings.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/etc/opengpts/settings.json"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn json_error_display() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(SettingsError::from(json_err).to_string().starts_with("malformed settings"));
    }

    #[test]
    fn invalid_value_display() {
        let err = SettingsError::InvalidValue("store.poolSize must be at least 1".into());
        assert_eq!(
            err.to_string(),
            "invalid settings value: store.poolSize must be at least 1"
        );
    }
}
