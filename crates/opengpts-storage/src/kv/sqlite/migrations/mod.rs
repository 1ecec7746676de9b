//! Versioned schema for the `SQLite` key-value tables.
//!
//! Each step is an embedded SQL script. [`run_migrations`] applies the steps
//! newer than the recorded version, one transaction per step, and records
//! each in `kv_schema_version`.

use rusqlite::{Connection, params};
use tracing::info;

use crate::errors::{Result, StoreError};

struct Step {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const STEPS: &[Step] = &[Step {
    version: 1,
    name: "key registry with set, hash and list tables",
    sql: include_str!("v001_kv_schema.sql"),
}];

fn failed(version: u32, what: &str, e: &rusqlite::Error) -> StoreError {
    StoreError::Migration {
        message: format!("v{version}: {what}: {e}"),
    }
}

/// Bring the schema up to [`latest_version`]. Returns how many steps ran.
pub fn run_migrations(conn: &Connection) -> Result<u32> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS kv_schema_version (
           version    INTEGER PRIMARY KEY,
           name       TEXT    NOT NULL,
           applied_at TEXT    NOT NULL DEFAULT (datetime('now'))
         );",
    )
    .map_err(|e| failed(0, "create kv_schema_version", &e))?;

    let from = current_version(conn)?;
    let pending: Vec<&Step> = STEPS.iter().filter(|s| s.version > from).collect();
    for step in &pending {
        info!(version = step.version, name = step.name, "migrating kv schema");
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| failed(step.version, "begin", &e))?;
        tx.execute_batch(step.sql)
            .map_err(|e| failed(step.version, step.name, &e))?;
        let _ = tx
            .execute(
                "INSERT INTO kv_schema_version (version, name) VALUES (?1, ?2)",
                params![step.version, step.name],
            )
            .map_err(|e| failed(step.version, "record version", &e))?;
        tx.commit().map_err(|e| failed(step.version, "commit", &e))?;
    }
    Ok(u32::try_from(pending.len()).unwrap_or(u32::MAX))
}

/// Highest applied version, 0 on a fresh database.
pub fn current_version(conn: &Connection) -> Result<u32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM kv_schema_version",
        [],
        |row| row.get(0),
    )
    .map_err(|e| failed(0, "read kv_schema_version", &e))
}

/// Version the code expects.
pub fn latest_version() -> u32 {
    STEPS.last().map_or(0, |s| s.version)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn tables(conn: &Connection) -> Vec<String> {
        conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get::<_, String>(0))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap()
    }

    #[test]
    fn fresh_database_gets_kv_tables() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(current_version(&conn).ok(), None);
        assert_eq!(run_migrations(&conn).unwrap(), 1);
        assert_eq!(
            tables(&conn),
            [
                "kv_hash_fields",
                "kv_keys",
                "kv_list_items",
                "kv_schema_version",
                "kv_set_members"
            ]
        );
    }

    #[test]
    fn second_run_applies_nothing() {
        let conn = Connection::open_in_memory().unwrap();
        let _ = run_migrations(&conn).unwrap();
        assert_eq!(run_migrations(&conn).unwrap(), 0);
        assert_eq!(current_version(&conn).unwrap(), latest_version());
    }

    #[test]
    fn unknown_key_kind_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        let _ = run_migrations(&conn).unwrap();
        assert!(
            conn.execute("INSERT INTO kv_keys (key, kind) VALUES ('k', 'zset')", [])
                .is_err()
        );
    }
}
