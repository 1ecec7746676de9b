use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, instrument};

use super::connection::{self, ConnectionConfig, ConnectionPool, PooledConnection};
use super::migrations::run_migrations;
use crate::codec::RawValue;
use crate::errors::{Result, StoreError};
use crate::kv::{Batch, Command, KvStore, Reply, resolve_range};

const SET: &str = "set";
const HASH: &str = "hash";
const LIST: &str = "list";

/// [`KvStore`] backed by a pooled `SQLite` database.
pub struct SqliteStore {
    pool: ConnectionPool,
}

impl SqliteStore {
    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_pool(connection::new_in_memory(&ConnectionConfig::default())?)
    }

    /// Open (or create) a database file at `path`.
    pub fn open_file(path: &str, config: &ConnectionConfig) -> Result<Self> {
        Self::from_pool(connection::new_file(path, config)?)
    }

    /// Wrap an existing pool, applying pending migrations first.
    pub fn from_pool(pool: ConnectionPool) -> Result<Self> {
        {
            let conn = pool.get()?;
            let applied = run_migrations(&conn)?;
            if applied > 0 {
                debug!(applied, "kv schema migrated");
            }
        }
        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection> {
        Ok(self.pool.get()?)
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("max_size", &self.pool.max_size())
            .finish_non_exhaustive()
    }
}

/// The registered type of `key`, if it exists.
fn key_kind(conn: &Connection, key: &str) -> Result<Option<String>> {
    Ok(conn
        .query_row("SELECT kind FROM kv_keys WHERE key = ?1", [key], |row| {
            row.get(0)
        })
        .optional()?)
}

/// Fail unless `key` is absent or holds `kind`. Returns whether it exists.
fn check_kind(conn: &Connection, key: &str, kind: &'static str) -> Result<bool> {
    match key_kind(conn, key)? {
        None => Ok(false),
        Some(found) if found == kind => Ok(true),
        Some(_) => Err(StoreError::WrongType {
            key: key.to_string(),
            expected: kind,
        }),
    }
}

/// Register `key` as `kind` if it does not exist yet.
fn claim(conn: &Connection, key: &str, kind: &'static str) -> Result<()> {
    if !check_kind(conn, key, kind)? {
        let _ = conn.execute(
            "INSERT INTO kv_keys (key, kind) VALUES (?1, ?2)",
            params![key, kind],
        )?;
    }
    Ok(())
}

fn sadd(conn: &Connection, key: &str, member: &[u8]) -> Result<Reply> {
    claim(conn, key, SET)?;
    let added = conn.execute(
        "INSERT OR IGNORE INTO kv_set_members (key, member) VALUES (?1, ?2)",
        params![key, member],
    )?;
    Ok(Reply::Integer(i64::try_from(added).unwrap_or(i64::MAX)))
}

fn hset(conn: &Connection, key: &str, fields: &[(String, RawValue)]) -> Result<Reply> {
    let exists = check_kind(conn, key, HASH)?;
    if !exists && fields.iter().all(|(_, v)| v.is_none()) {
        return Ok(Reply::Ok);
    }
    claim(conn, key, HASH)?;

    for (field, value) in fields {
        let _ = match value {
            Some(bytes) => conn.execute(
                "INSERT INTO kv_hash_fields (key, field, value) VALUES (?1, ?2, ?3)
                 ON CONFLICT (key, field) DO UPDATE SET value = excluded.value",
                params![key, field, bytes],
            )?,
            None => conn.execute(
                "DELETE FROM kv_hash_fields WHERE key = ?1 AND field = ?2",
                params![key, field],
            )?,
        };
    }

    let remaining: i64 = conn.query_row(
        "SELECT COUNT(*) FROM kv_hash_fields WHERE key = ?1",
        [key],
        |row| row.get(0),
    )?;
    if remaining == 0 {
        let _ = conn.execute("DELETE FROM kv_keys WHERE key = ?1", [key])?;
    }
    Ok(Reply::Ok)
}

fn hmget(conn: &Connection, key: &str, fields: &[String]) -> Result<Reply> {
    if !check_kind(conn, key, HASH)? {
        return Ok(Reply::Values(vec![None; fields.len()]));
    }
    let mut stmt =
        conn.prepare_cached("SELECT value FROM kv_hash_fields WHERE key = ?1 AND field = ?2")?;
    let values = fields
        .iter()
        .map(|field| {
            stmt.query_row(params![key, field], |row| row.get::<_, Vec<u8>>(0))
                .optional()
                .map_err(StoreError::from)
        })
        .collect::<Result<Vec<RawValue>>>()?;
    Ok(Reply::Values(values))
}

fn lpush(conn: &Connection, key: &str, value: &[u8]) -> Result<Reply> {
    claim(conn, key, LIST)?;
    let _ = conn.execute(
        "INSERT INTO kv_list_items (key, position, value)
         SELECT ?1, COALESCE(MIN(position), 0) - 1, ?2 FROM kv_list_items WHERE key = ?1",
        params![key, value],
    )?;
    let len: i64 = conn.query_row(
        "SELECT COUNT(*) FROM kv_list_items WHERE key = ?1",
        [key],
        |row| row.get(0),
    )?;
    Ok(Reply::Integer(len))
}

fn apply(conn: &Connection, command: &Command) -> Result<Reply> {
    match command {
        Command::SAdd { key, member } => sadd(conn, key, member),
        Command::HSet { key, fields } => hset(conn, key, fields),
        Command::HMGet { key, fields } => hmget(conn, key, fields),
        Command::LPush { key, value } => lpush(conn, key, value),
    }
}

impl KvStore for SqliteStore {
    fn smembers(&self, key: &str) -> Result<Vec<Vec<u8>>> {
        let conn = self.conn()?;
        if !check_kind(&conn, key, SET)? {
            return Ok(Vec::new());
        }
        let mut stmt =
            conn.prepare_cached("SELECT member FROM kv_set_members WHERE key = ?1 ORDER BY rowid")?;
        let members = stmt
            .query_map([key], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<Vec<u8>>>>()?;
        Ok(members)
    }

    fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<Vec<u8>>> {
        let conn = self.conn()?;
        if !check_kind(&conn, key, LIST)? {
            return Ok(Vec::new());
        }
        let len: i64 = conn.query_row(
            "SELECT COUNT(*) FROM kv_list_items WHERE key = ?1",
            [key],
            |row| row.get(0),
        )?;
        let Some(range) = resolve_range(usize::try_from(len).unwrap_or(0), start, stop) else {
            return Ok(Vec::new());
        };
        let offset = i64::try_from(range.start).unwrap_or(i64::MAX);
        let limit = i64::try_from(range.len()).unwrap_or(i64::MAX);

        let mut stmt = conn.prepare_cached(
            "SELECT value FROM kv_list_items WHERE key = ?1
             ORDER BY position LIMIT ?2 OFFSET ?3",
        )?;
        let items = stmt
            .query_map(params![key, limit, offset], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<Vec<u8>>>>()?;
        Ok(items)
    }

    #[instrument(skip_all, fields(commands = batch.len()))]
    fn execute(&self, batch: Batch) -> Result<Vec<Reply>> {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;
        let replies = batch
            .commands()
            .iter()
            .map(|command| apply(&tx, command))
            .collect::<Result<Vec<_>>>()?;
        tx.commit()?;
        Ok(replies)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
