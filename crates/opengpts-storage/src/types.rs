//! Entity records.
//!
//! `put` returns the fully populated [`Assistant`] / [`Thread`] it wrote.
//! `list` and `get` return [`AssistantRecord`] / [`ThreadRecord`], where every
//! hash-backed field is optional: an id can sit in the index set with no
//! detail hash behind it, and that reads back as all-`None`.

use chrono::{DateTime, Utc};
use opengpts_core::Message;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codec::timestamp;

/// Hash fields read for an assistant, in reply order.
pub const ASSISTANT_FIELDS: [&str; 4] = ["assistant_id", "name", "config", "updated_at"];

/// Hash fields read for a thread, in reply order.
pub const THREAD_FIELDS: [&str; 4] = ["assistant_id", "thread_id", "name", "updated_at"];

/// An assistant as written.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Assistant {
    /// Owning user.
    pub user_id: String,
    /// Assistant id.
    pub assistant_id: String,
    /// Display name.
    pub name: String,
    /// Free-form configuration.
    pub config: Value,
    /// Server-assigned write time.
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// An assistant as read back from the store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssistantRecord {
    /// Owning user (the caller's user id).
    pub user_id: String,
    /// Assistant id.
    #[serde(default)]
    pub assistant_id: Option<String>,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Free-form configuration.
    #[serde(default)]
    pub config: Option<Value>,
    /// Last write time.
    #[serde(default, with = "timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A thread as written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    /// Owning user.
    pub user_id: String,
    /// Thread id.
    pub thread_id: String,
    /// Assistant the thread talks to. Not checked for existence.
    pub assistant_id: String,
    /// Display name.
    pub name: String,
    /// Server-assigned write time.
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// A thread as read back from the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadRecord {
    /// Owning user (the caller's user id).
    pub user_id: String,
    /// Thread id.
    #[serde(default)]
    pub thread_id: Option<String>,
    /// Assistant the thread talks to.
    #[serde(default)]
    pub assistant_id: Option<String>,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Last write time.
    #[serde(default, with = "timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Messages of one thread, oldest first.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreadMessages {
    /// Decoded messages.
    pub messages: Vec<Message>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
