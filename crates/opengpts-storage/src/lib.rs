//! # opengpts-storage
//!
//! Per-user storage of assistants, threads and thread messages over a
//! Redis-like key-value store.
//!
//! ## Architecture
//!
//! - **[`keys`]**: Key-space layout. Every key embeds the user id.
//! - **[`codec`]**: Compact-JSON field codec; null fields become deletions.
//! - **[`kv`]**: The [`KvStore`](kv::KvStore) trait, command batches and the
//!   memory, `SQLite` and (feature `redis`) Redis backends.
//! - **[`repositories`]**: Stateless repositories that take `&dyn KvStore`.
//! - **[`storage`]**: [`Storage`], a cloneable facade over a shared store.
//!
//! ## Consistency
//!
//! `put` adds the id to the index set and writes the detail hash in one
//! batch, but only the `SQLite` backend applies a batch atomically. The
//! index is advisory: an indexed id whose hash is missing reads back as a
//! record of `None` fields.

#![deny(unsafe_code)]

pub mod codec;
pub mod errors;
pub mod factory;
pub mod keys;
pub mod kv;
pub mod repositories;
pub mod storage;
pub mod types;

pub use errors::{Result, StoreError};
pub use factory::open_store;
pub use kv::{Batch, KvStore, MemoryStore, SqliteStore};
pub use storage::Storage;
pub use types::{Assistant, AssistantRecord, Thread, ThreadMessages, ThreadRecord};
