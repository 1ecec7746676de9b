//! Redis [`KvStore`] over an `r2d2` pool of synchronous connections.
//!
//! A [`Batch`] becomes one Redis pipeline. It is not wrapped in
//! `MULTI`/`EXEC`, so a failure part-way leaves earlier commands applied.
//!
//! The pool is built without waiting for a connection; an unreachable server
//! surfaces on the first command, not at open.

use std::time::Duration;

use ::redis::{Client, ErrorKind, Pipeline, RedisError, Value, from_redis_value};
use tracing::instrument;

use super::{Batch, Command, KvStore, Reply};
use crate::codec::RawValue;
use crate::errors::{Result, StoreError};

/// How a pipeline reply maps back onto a [`Reply`].
#[derive(Debug, PartialEq, Eq)]
enum Expect {
    /// One integer reply.
    Integer,
    /// One multi-bulk reply.
    Values,
    /// Nothing was sent; answer with this reply.
    Synthetic(Reply),
}

/// [`KvStore`] backed by a Redis server.
pub struct RedisStore {
    pool: r2d2::Pool<Client>,
}

impl RedisStore {
    /// Connect to `url` with a pool of at most `pool_size` connections.
    pub fn open(url: &str, pool_size: u32, connection_timeout: Duration) -> Result<Self> {
        let client = Client::open(url)?;
        let pool = r2d2::Pool::builder()
            .max_size(pool_size)
            .connection_timeout(connection_timeout)
            .build_unchecked(client);
        Ok(Self { pool })
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("max_size", &self.pool.max_size())
            .finish_non_exhaustive()
    }
}

/// Classify a Redis error. `WRONGTYPE` replies and reply-shape mismatches
/// are data-integrity errors like on the other backends; everything else is
/// transport.
fn classify(e: RedisError, key: &str, expected: &'static str) -> StoreError {
    if e.code() == Some("WRONGTYPE") || e.kind() == ErrorKind::TypeError {
        StoreError::WrongType {
            key: key.to_string(),
            expected,
        }
    } else {
        StoreError::Redis(e)
    }
}

fn command_key(command: &Command) -> &str {
    match command {
        Command::SAdd { key, .. }
        | Command::HSet { key, .. }
        | Command::HMGet { key, .. }
        | Command::LPush { key, .. } => key,
    }
}

/// Translate commands into one pipeline plus the reply each command expects.
///
/// `HSET` fields with a `None` value go out as a separate `HDEL`. Both halves
/// are ignored in the reply stream and answered with a synthetic `Ok`, as is
/// an `HMGET` of no fields, which is never sent.
fn build_pipeline(commands: Vec<Command>) -> (Pipeline, Vec<Expect>) {
    let mut pipe = ::redis::pipe();
    let mut expects = Vec::with_capacity(commands.len());

    for command in commands {
        match command {
            Command::SAdd { key, member } => {
                let _ = pipe.cmd("SADD").arg(key).arg(member);
                expects.push(Expect::Integer);
            }
            Command::HSet { key, fields } => {
                let mut sets = Vec::new();
                let mut deletes = Vec::new();
                for (field, value) in fields {
                    match value {
                        Some(bytes) => sets.push((field, bytes)),
                        None => deletes.push(field),
                    }
                }
                if !sets.is_empty() {
                    let cmd = pipe.cmd("HSET").arg(&key);
                    for (field, value) in sets {
                        let _ = cmd.arg(field).arg(value);
                    }
                    let _ = pipe.ignore();
                }
                if !deletes.is_empty() {
                    let cmd = pipe.cmd("HDEL").arg(&key);
                    for field in deletes {
                        let _ = cmd.arg(field);
                    }
                    let _ = pipe.ignore();
                }
                expects.push(Expect::Synthetic(Reply::Ok));
            }
            Command::HMGet { key, fields } => {
                if fields.is_empty() {
                    expects.push(Expect::Synthetic(Reply::Values(Vec::new())));
                } else {
                    let _ = pipe.cmd("HMGET").arg(key).arg(fields);
                    expects.push(Expect::Values);
                }
            }
            Command::LPush { key, value } => {
                let _ = pipe.cmd("LPUSH").arg(key).arg(value);
                expects.push(Expect::Integer);
            }
        }
    }
    (pipe, expects)
}

/// Pair the non-ignored pipeline replies with `expects`, in order.
fn map_replies(expects: Vec<Expect>, values: Vec<Value>) -> Result<Vec<Reply>> {
    let mut values = values.into_iter();
    let replies = expects
        .into_iter()
        .map(|expect| match expect {
            Expect::Synthetic(reply) => Ok(reply),
            Expect::Integer => {
                let value = next_value(&mut values)?;
                from_redis_value(&value)
                    .map(Reply::Integer)
                    .map_err(|e| unexpected(&e))
            }
            Expect::Values => {
                let value = next_value(&mut values)?;
                from_redis_value::<Vec<RawValue>>(&value)
                    .map(Reply::Values)
                    .map_err(|e| unexpected(&e))
            }
        })
        .collect::<Result<Vec<_>>>()?;
    if values.next().is_some() {
        return Err(StoreError::UnexpectedReply(
            "pipeline returned too many replies".into(),
        ));
    }
    Ok(replies)
}

fn unexpected(e: &RedisError) -> StoreError {
    StoreError::UnexpectedReply(e.to_string())
}

fn next_value(values: &mut impl Iterator<Item = Value>) -> Result<Value> {
    values
        .next()
        .ok_or_else(|| StoreError::UnexpectedReply("pipeline returned too few replies".into()))
}

impl KvStore for RedisStore {
    fn smembers(&self, key: &str) -> Result<Vec<Vec<u8>>> {
        let mut conn = self.pool.get()?;
        ::redis::cmd("SMEMBERS")
            .arg(key)
            .query(&mut *conn)
            .map_err(|e| classify(e, key, "set"))
    }

    fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<Vec<u8>>> {
        let mut conn = self.pool.get()?;
        ::redis::cmd("LRANGE")
            .arg(key)
            .arg(start)
            .arg(stop)
            .query(&mut *conn)
            .map_err(|e| classify(e, key, "list"))
    }

    #[instrument(skip_all, fields(commands = batch.len()))]
    fn execute(&self, batch: Batch) -> Result<Vec<Reply>> {
        let keys = batch
            .commands()
            .iter()
            .map(command_key)
            .collect::<Vec<_>>()
            .join(", ");
        let (pipe, expects) = build_pipeline(batch.into_commands());

        let mut conn = self.pool.get()?;
        let values: Vec<Value> = pipe
            .query(&mut *conn)
            .map_err(|e| classify(e, &keys, "a type matching its command"))?;
        map_replies(expects, values)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
