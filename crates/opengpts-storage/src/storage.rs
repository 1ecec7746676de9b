//! High-level `Storage` API.
//!
//! [`Storage`] owns a shared store handle and forwards to the stateless
//! repositories. Cloning is cheap; clones share the same pooled backend.

use std::sync::Arc;

use opengpts_core::Message;
use opengpts_settings::StoreSettings;
use serde_json::Value;

use crate::errors::Result;
use crate::factory::open_store;
use crate::kv::KvStore;
use crate::repositories::{AssistantRepo, MessageRepo, ThreadRepo};
use crate::types::{Assistant, AssistantRecord, Thread, ThreadMessages, ThreadRecord};

/// Per-user assistant, thread and message storage.
#[derive(Clone, Debug)]
pub struct Storage {
    store: Arc<dyn KvStore>,
}

impl Storage {
    /// Wrap an existing store handle.
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Open the backend named by `settings.url`.
    pub fn open(settings: &StoreSettings) -> Result<Self> {
        Ok(Self::new(open_store(settings)?))
    }

    /// The underlying store.
    pub fn store(&self) -> &dyn KvStore {
        self.store.as_ref()
    }

    /// See [`AssistantRepo::list`].
    pub fn list_assistants(&self, user_id: &str) -> Result<Vec<AssistantRecord>> {
        AssistantRepo::list(self.store(), user_id)
    }

    /// See [`AssistantRepo::get`].
    pub fn get_assistant(&self, user_id: &str, assistant_id: &str) -> Result<Option<AssistantRecord>> {
        AssistantRepo::get(self.store(), user_id, assistant_id)
    }

    /// See [`AssistantRepo::put`].
    pub fn put_assistant(
        &self,
        user_id: &str,
        assistant_id: &str,
        name: &str,
        config: Value,
    ) -> Result<Assistant> {
        AssistantRepo::put(self.store(), user_id, assistant_id, name, config)
    }

    /// See [`ThreadRepo::list`].
    pub fn list_threads(&self, user_id: &str) -> Result<Vec<ThreadRecord>> {
        ThreadRepo::list(self.store(), user_id)
    }

    /// See [`ThreadRepo::get`].
    pub fn get_thread(&self, user_id: &str, thread_id: &str) -> Result<Option<ThreadRecord>> {
        ThreadRepo::get(self.store(), user_id, thread_id)
    }

    /// See [`ThreadRepo::put`].
    pub fn put_thread(
        &self,
        user_id: &str,
        thread_id: &str,
        assistant_id: &str,
        name: &str,
    ) -> Result<Thread> {
        ThreadRepo::put(self.store(), user_id, thread_id, assistant_id, name)
    }

    /// See [`MessageRepo::get_thread_messages`].
    pub fn get_thread_messages(&self, user_id: &str, thread_id: &str) -> Result<ThreadMessages> {
        MessageRepo::get_thread_messages(self.store(), user_id, thread_id)
    }

    /// See [`MessageRepo::append_thread_message`].
    pub fn append_thread_message(
        &self,
        user_id: &str,
        thread_id: &str,
        message: &Message,
    ) -> Result<i64> {
        MessageRepo::append_thread_message(self.store(), user_id, thread_id, message)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
