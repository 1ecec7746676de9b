//! Key-value store connection settings.

use serde::{Deserialize, Serialize};

/// Key-value store connection settings.
///
/// The backend is chosen from the URL scheme: `redis://` / `rediss://`,
/// `sqlite://<path>` (or `sqlite::memory:`), or `memory://`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreSettings {
    /// Store endpoint URL (`REDIS_URL` in the environment).
    pub url: String,
    /// Maximum pooled connections.
    pub pool_size: u32,
    /// How long to wait for a pooled connection, in milliseconds.
    pub connection_timeout_ms: u64,
    /// `SQLite` busy timeout in milliseconds.
    pub busy_timeout_ms: u32,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            url: "sqlite://~/.opengpts/store.db".to_string(),
            pool_size: 8,
            connection_timeout_ms: 5_000,
            busy_timeout_ms: 30_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_defaults() {
        let s = StoreSettings::default();
        assert_eq!(s.url, "sqlite://~/.opengpts/store.db");
        assert_eq!(s.pool_size, 8);
        assert_eq!(s.connection_timeout_ms, 5_000);
        assert_eq!(s.busy_timeout_ms, 30_000);
    }

    #[test]
    fn store_serde_camel_case() {
        let json = serde_json::to_value(StoreSettings::default()).unwrap();
        assert!(json.get("busyTimeoutMs").is_some());
        assert!(json.get("pool_size").is_none());
    }
}
