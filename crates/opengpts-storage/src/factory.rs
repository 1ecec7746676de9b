//! Store construction from settings.
//!
//! The URL scheme picks the backend:
//!
//! | URL | Backend |
//! |---|---|
//! | `memory://` | [`MemoryStore`] |
//! | `sqlite::memory:` | in-memory [`SqliteStore`] |
//! | `sqlite://<path>` | file-backed [`SqliteStore`] (`~` expanded) |
//! | `redis://…`, `rediss://…` | `RedisStore` (feature `redis`) |

use std::path::Path;
use std::sync::Arc;

use opengpts_settings::{StoreSettings, expand_home};
use tracing::info;

use crate::errors::{Result, StoreError};
use crate::kv::sqlite::ConnectionConfig;
use crate::kv::{KvStore, MemoryStore, SqliteStore};

/// Open the store described by `settings`.
pub fn open_store(settings: &StoreSettings) -> Result<Arc<dyn KvStore>> {
    let url = settings.url.trim();

    if url == "memory://" {
        info!("using in-memory store");
        return Ok(Arc::new(MemoryStore::new()));
    }

    if url == "sqlite::memory:" {
        info!("using in-memory sqlite store");
        return Ok(Arc::new(SqliteStore::open_in_memory()?));
    }

    if let Some(path) = url.strip_prefix("sqlite://") {
        if path.is_empty() {
            return Err(StoreError::InvalidUrl(format!("{url}: missing database path")));
        }
        let path = expand_home(path);
        if let Some(parent) = Path::new(&path)
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
        {
            std::fs::create_dir_all(parent)?;
        }
        info!(path = %path, "opening sqlite store");
        let store = SqliteStore::open_file(&path, &ConnectionConfig::from(settings))?;
        return Ok(Arc::new(store));
    }

    if url.starts_with("redis://") || url.starts_with("rediss://") {
        return open_redis(url, settings);
    }

    Err(StoreError::InvalidUrl(format!("{url}: unsupported scheme")))
}

#[cfg(feature = "redis")]
fn open_redis(url: &str, settings: &StoreSettings) -> Result<Arc<dyn KvStore>> {
    use std::time::Duration;

    info!(pool_size = settings.pool_size, "connecting to redis");
    let store = crate::kv::RedisStore::open(
        url,
        settings.pool_size,
        Duration::from_millis(settings.connection_timeout_ms),
    )?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "redis"))]
fn open_redis(url: &str, _settings: &StoreSettings) -> Result<Arc<dyn KvStore>> {
    Err(StoreError::InvalidUrl(format!(
        "{url}: built without the `redis` feature"
    )))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
