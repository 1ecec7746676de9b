//! `r2d2` pools of `SQLite` connections for [`SqliteStore`](super::SqliteStore).
//!
//! An in-memory database exists per connection, so [`new_in_memory`] builds
//! a single-connection pool that never recycles its connection.

use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::errors::Result;

/// Alias for the connection pool type.
pub type ConnectionPool = Pool<SqliteConnectionManager>;

/// Alias for a pooled connection.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Configuration for the connection pool.
#[derive(Clone, Debug)]
pub struct ConnectionConfig {
    /// Maximum pool size (default: 8).
    pub pool_size: u32,
    /// Busy timeout in milliseconds (default: 30000).
    pub busy_timeout_ms: u32,
    /// How long `pool.get()` waits for a free connection (default: 5000).
    pub connection_timeout_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            pool_size: 8,
            busy_timeout_ms: 30_000,
            connection_timeout_ms: 5_000,
        }
    }
}

impl From<&opengpts_settings::StoreSettings> for ConnectionConfig {
    fn from(s: &opengpts_settings::StoreSettings) -> Self {
        Self {
            pool_size: s.pool_size,
            busy_timeout_ms: s.busy_timeout_ms,
            connection_timeout_ms: s.connection_timeout_ms,
        }
    }
}

/// Per-connection pragmas for the key-value tables.
#[derive(Debug)]
struct KvPragmas {
    busy_timeout_ms: u32,
}

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for KvPragmas {
    fn on_acquire(&self, conn: &mut Connection) -> std::result::Result<(), rusqlite::Error> {
        // Cascading deletes from kv_keys need foreign keys on.
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.busy_timeout(Duration::from_millis(u64::from(self.busy_timeout_ms)))?;
        let _mode = conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })?;
        Ok(())
    }
}

fn builder(config: &ConnectionConfig) -> r2d2::Builder<SqliteConnectionManager> {
    Pool::builder()
        .connection_timeout(Duration::from_millis(config.connection_timeout_ms))
        .connection_customizer(Box::new(KvPragmas {
            busy_timeout_ms: config.busy_timeout_ms,
        }))
}

/// Single-connection pool over a private in-memory database.
pub fn new_in_memory(config: &ConnectionConfig) -> Result<ConnectionPool> {
    Ok(builder(config)
        .max_size(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .build(SqliteConnectionManager::memory())?)
}

/// Pool over the database file at `path`, created if missing.
pub fn new_file(path: &str, config: &ConnectionConfig) -> Result<ConnectionPool> {
    Ok(builder(config)
        .max_size(config.pool_size)
        .build(SqliteConnectionManager::file(path))?)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn journal_mode(conn: &Connection) -> String {
        conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn in_memory_pool_has_one_connection() {
        let pool = new_in_memory(&ConnectionConfig::default()).unwrap();
        assert_eq!(pool.max_size(), 1);
        let conn = pool.get().unwrap();
        assert_eq!(journal_mode(&conn), "memory");
    }

    #[test]
    fn in_memory_pool_keeps_data_between_checkouts() {
        let pool = new_in_memory(&ConnectionConfig::default()).unwrap();
        {
            let conn = pool.get().unwrap();
            conn.execute_batch("CREATE TABLE t (x INTEGER); INSERT INTO t VALUES (7);")
                .unwrap();
        }
        let conn = pool.get().unwrap();
        let x: i64 = conn.query_row("SELECT x FROM t", [], |r| r.get(0)).unwrap();
        assert_eq!(x, 7);
    }

    #[test]
    fn file_pool_uses_wal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");
        let pool = new_file(path.to_str().unwrap(), &ConnectionConfig::default()).unwrap();
        let conn = pool.get().unwrap();
        assert_eq!(journal_mode(&conn), "wal");
    }

    #[test]
    fn custom_pool_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");
        let config = ConnectionConfig {
            pool_size: 2,
            ..Default::default()
        };
        let pool = new_file(path.to_str().unwrap(), &config).unwrap();
        assert_eq!(pool.max_size(), 2);
    }

    #[test]
    fn config_from_settings() {
        let settings = opengpts_settings::StoreSettings {
            pool_size: 3,
            ..Default::default()
        };
        let config = ConnectionConfig::from(&settings);
        assert_eq!(config.pool_size, 3);
        assert_eq!(config.busy_timeout_ms, 30_000);
    }
}
