//! `SQLite` backend for the key-value store.
//!
//! Emulates the Redis data types the repositories use on top of four tables:
//! a key registry that records each key's type, plus one table per type.
//!
//! - **[`connection`]**: `r2d2` connection pool with WAL mode, foreign keys and
//!   a busy timeout applied to every connection.
//! - **[`migrations`]**: Version-tracked schema evolution, embedded at compile
//!   time and run transactionally.
//! - **[`store`]**: [`SqliteStore`], the [`KvStore`](super::KvStore)
//!   implementation. Each batch runs in one transaction.

pub mod connection;
pub mod migrations;
mod store;

pub use connection::{ConnectionConfig, ConnectionPool, PooledConnection, new_file, new_in_memory};
pub use migrations::{current_version, latest_version, run_migrations};
pub use store::SqliteStore;
