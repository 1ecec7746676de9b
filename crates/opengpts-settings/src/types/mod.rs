//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` for the JSON settings
//! file. Each type implements [`Default`] with production default values and
//! is marked `#[serde(default)]`, so partial JSON is accepted.

mod ingest;
mod store;

pub use ingest::*;
pub use store::*;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings type.
///
/// # JSON Format
///
/// ```json
/// {
///   "store": { "url": "redis://localhost:6379/0" },
///   "ingest": { "chunkSize": 500 },
///   "logging": { "level": "info" }
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OpenGptsSettings {
    /// Key-value store connection.
    pub store: StoreSettings,
    /// Document ingestion pipeline.
    pub ingest: IngestSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl OpenGptsSettings {
    /// Check cross-field constraints that serde defaults cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.store.url.trim().is_empty() {
            return Err(SettingsError::InvalidValue("store.url is empty".into()));
        }
        if self.store.pool_size == 0 {
            return Err(SettingsError::InvalidValue(
                "store.poolSize must be at least 1".into(),
            ));
        }
        if self.ingest.chunk_size == 0 {
            return Err(SettingsError::InvalidValue(
                "ingest.chunkSize must be at least 1".into(),
            ));
        }
        if self.ingest.chunk_overlap > self.ingest.chunk_size {
            return Err(SettingsError::InvalidValue(format!(
                "ingest.chunkOverlap ({}) is larger than ingest.chunkSize ({})",
                self.ingest.chunk_overlap, self.ingest.chunk_size
            )));
        }
        Ok(())
    }
}

/// Logging configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default `tracing` filter directive (overridden by `RUST_LOG`).
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn default_settings_serde_roundtrip() {
        let defaults = OpenGptsSettings::default();
        let json = serde_json::to_string(&defaults).unwrap();
        let back: OpenGptsSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.store.url, defaults.store.url);
        assert_eq!(back.store.pool_size, defaults.store.pool_size);
        assert_eq!(back.ingest.chunk_size, defaults.ingest.chunk_size);
        assert_eq!(back.logging.level, defaults.logging.level);
    }

    #[test]
    fn default_settings_json_field_names() {
        let json = serde_json::to_value(OpenGptsSettings::default()).unwrap();
        let store = json.get("store").unwrap();
        assert!(store.get("poolSize").is_some());
        assert!(store.get("connectionTimeoutMs").is_some());
        let ingest = json.get("ingest").unwrap();
        assert!(ingest.get("chunkOverlap").is_some());
        assert!(ingest.get("inputKey").is_some());
        // API key omitted when None
        assert!(ingest["embedding"].get("apiKey").is_none());
    }

    #[test]
    fn empty_json_produces_defaults() {
        let settings: OpenGptsSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.store.pool_size, 8);
        assert_eq!(settings.ingest.input_key, "file_contents");
    }

    #[test]
    fn partial_json_overrides() {
        let json = serde_json::json!({
            "store": { "url": "memory://" },
            "ingest": { "embedding": { "model": "text-embedding-3-small" } }
        });
        let settings: OpenGptsSettings = serde_json::from_value(json).unwrap();
        assert_eq!(settings.store.url, "memory://");
        assert_eq!(settings.ingest.embedding.model, "text-embedding-3-small");
        // Unset fields keep defaults
        assert_eq!(settings.store.pool_size, 8);
        assert_eq!(settings.ingest.chunk_size, 1000);
    }

    #[test]
    fn validate_rejects_overlap_larger_than_chunk() {
        let mut settings = OpenGptsSettings::default();
        settings.ingest.chunk_size = 100;
        settings.ingest.chunk_overlap = 150;
        assert_matches!(settings.validate(), Err(SettingsError::InvalidValue(msg)) if msg.contains("chunkOverlap"));
    }

    #[test]
    fn validate_rejects_zero_pool() {
        let mut settings = OpenGptsSettings::default();
        settings.store.pool_size = 0;
        assert_matches!(settings.validate(), Err(SettingsError::InvalidValue(_)));
    }

    #[test]
    fn validate_rejects_blank_url() {
        let mut settings = OpenGptsSettings::default();
        settings.store.url = "  ".into();
        assert_matches!(settings.validate(), Err(SettingsError::InvalidValue(_)));
    }
}
