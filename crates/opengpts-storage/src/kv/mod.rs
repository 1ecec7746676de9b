//! Key-value store abstraction.
//!
//! [`KvStore`] is the narrow slice of a Redis-like store the repositories
//! need: set membership, multi-field hash reads and writes, and list range
//! reads. Writes and multi-key reads go through a [`Batch`], which a backend
//! sends in one round trip and answers with one [`Reply`] per command, in
//! issuance order.
//!
//! A batch is a pipeline, not a transaction. Backends may apply it
//! atomically (`SQLite` does) but callers must not rely on it.
//!
//! # Backends
//!
//! - [`memory::MemoryStore`]: in-process maps, for tests and ephemeral use
//! - [`sqlite::SqliteStore`]: `r2d2`-pooled `SQLite` file or in-memory database
//! - `redis::RedisStore` (feature `redis`): `r2d2`-pooled Redis connections

pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;
pub mod sqlite;

use crate::codec::RawValue;
use crate::errors::{Result, StoreError};

pub use memory::MemoryStore;
#[cfg(feature = "redis")]
pub use self::redis::RedisStore;
pub use sqlite::SqliteStore;

/// A single batched store command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Add `member` to the set at `key`. Replies with the number added (0 or 1).
    SAdd {
        /// Set key.
        key: String,
        /// Encoded member.
        member: Vec<u8>,
    },
    /// Write hash fields. `None` values delete the field. Replies `Ok`.
    HSet {
        /// Hash key.
        key: String,
        /// Field/value pairs in write order.
        fields: Vec<(String, RawValue)>,
    },
    /// Read hash fields. Replies with one value per field, `None` when absent.
    HMGet {
        /// Hash key.
        key: String,
        /// Field names to read.
        fields: Vec<String>,
    },
    /// Prepend `value` to the list at `key`. Replies with the new list length.
    LPush {
        /// List key.
        key: String,
        /// Encoded entry.
        value: Vec<u8>,
    },
}

/// The reply to one [`Command`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    /// Count reply (`SADD`, `LPUSH`).
    Integer(i64),
    /// Field values (`HMGET`).
    Values(Vec<RawValue>),
    /// Status reply (`HSET`).
    Ok,
}

impl Reply {
    /// Unwrap an `HMGET` reply.
    pub fn into_values(self) -> Result<Vec<RawValue>> {
        match self {
            Self::Values(values) => Ok(values),
            other => Err(StoreError::UnexpectedReply(format!(
                "expected field values, got {other:?}"
            ))),
        }
    }

    /// Unwrap a count reply.
    pub fn into_integer(self) -> Result<i64> {
        match self {
            Self::Integer(n) => Ok(n),
            other => Err(StoreError::UnexpectedReply(format!(
                "expected integer, got {other:?}"
            ))),
        }
    }
}

/// An ordered group of commands sent in one round trip.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Batch {
    commands: Vec<Command>,
}

impl Batch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an `SADD`.
    #[must_use]
    pub fn sadd(mut self, key: impl Into<String>, member: Vec<u8>) -> Self {
        self.commands.push(Command::SAdd {
            key: key.into(),
            member,
        });
        self
    }

    /// Queue an `HSET` of several fields.
    #[must_use]
    pub fn hset(mut self, key: impl Into<String>, fields: Vec<(String, RawValue)>) -> Self {
        self.commands.push(Command::HSet {
            key: key.into(),
            fields,
        });
        self
    }

    /// Queue an `HMGET`.
    #[must_use]
    pub fn hmget(mut self, key: impl Into<String>, fields: &[&str]) -> Self {
        self.commands.push(Command::HMGet {
            key: key.into(),
            fields: fields.iter().map(|f| (*f).to_string()).collect(),
        });
        self
    }

    /// Queue an `LPUSH`.
    #[must_use]
    pub fn lpush(mut self, key: impl Into<String>, value: Vec<u8>) -> Self {
        self.commands.push(Command::LPush {
            key: key.into(),
            value,
        });
        self
    }

    /// Queued commands in issuance order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Number of queued commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the batch has no commands.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Consume the batch, returning its commands.
    pub fn into_commands(self) -> Vec<Command> {
        self.commands
    }
}

/// A Redis-like key-value store.
///
/// Implementations hold their own (pooled) connections and are shared as
/// `Arc<dyn KvStore>`. Every method is a blocking round trip; transport
/// failures are returned as-is and never retried here.
pub trait KvStore: Send + Sync + std::fmt::Debug {
    /// All members of the set at `key` (empty if absent). Order is
    /// backend-defined.
    fn smembers(&self, key: &str) -> Result<Vec<Vec<u8>>>;

    /// Elements `start..=stop` of the list at `key`, with Redis index rules:
    /// negative indices count from the tail and out-of-range bounds clamp.
    fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<Vec<u8>>>;

    /// Run `batch` in one round trip, returning one reply per command.
    fn execute(&self, batch: Batch) -> Result<Vec<Reply>>;
}

/// Resolve Redis-style `LRANGE` bounds against a list of `len` elements.
///
/// Returns the inclusive-exclusive index range, or `None` when it selects
/// nothing.
pub fn resolve_range(len: usize, start: i64, stop: i64) -> Option<std::ops::Range<usize>> {
    let len = i64::try_from(len).ok()?;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if len == 0 || start > stop || start >= len {
        return None;
    }
    let start = usize::try_from(start).ok()?;
    let end = usize::try_from(stop + 1).ok()?;
    Some(start..end)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
