//! Thread repository.

use chrono::{SubsecRound, Utc};
use tracing::debug;

use crate::errors::Result;
use crate::keys;
use crate::kv::KvStore;
use crate::types::{THREAD_FIELDS, Thread, ThreadRecord};

/// Thread repository. Stateless; every method takes the store.
pub struct ThreadRepo;

impl ThreadRepo {
    /// All threads indexed for `user_id`, in index iteration order.
    pub fn list(store: &dyn KvStore, user_id: &str) -> Result<Vec<ThreadRecord>> {
        let records = super::list_records(
            store,
            user_id,
            &keys::threads_list_key(user_id),
            |id| keys::thread_key(user_id, id),
            &THREAD_FIELDS,
        )?;
        debug!(user_id, count = records.len(), "listed threads");
        Ok(records)
    }

    /// One thread, or `None` if it has no detail hash.
    pub fn get(store: &dyn KvStore, user_id: &str, thread_id: &str) -> Result<Option<ThreadRecord>> {
        super::get_record(
            store,
            user_id,
            &keys::thread_key(user_id, thread_id),
            &THREAD_FIELDS,
        )
    }

    /// Create or overwrite a thread. `assistant_id` is stored as given.
    pub fn put(
        store: &dyn KvStore,
        user_id: &str,
        thread_id: &str,
        assistant_id: &str,
        name: &str,
    ) -> Result<Thread> {
        let thread = Thread {
            user_id: user_id.to_string(),
            thread_id: thread_id.to_string(),
            assistant_id: assistant_id.to_string(),
            name: name.to_string(),
            updated_at: Utc::now().trunc_subsecs(6),
        };
        super::put_record(
            store,
            &keys::threads_list_key(user_id),
            thread_id,
            &keys::thread_key(user_id, thread_id),
            &thread,
        )?;
        debug!(user_id, thread_id, assistant_id, "saved thread");
        Ok(thread)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
