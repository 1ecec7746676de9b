//! Thread message lists.
//!
//! The chat-history writer `LPUSH`es each message envelope, so the stored
//! list is newest first. Reads reverse it.

use opengpts_core::{Message, StoredMessage};
use tracing::debug;

use crate::codec;
use crate::errors::{Result, StoreError};
use crate::keys;
use crate::kv::{Batch, KvStore};
use crate::types::ThreadMessages;

/// Message list repository. Stateless; every method takes the store.
pub struct MessageRepo;

impl MessageRepo {
    /// All messages of a thread, oldest first. Absent lists are empty.
    pub fn get_thread_messages(
        store: &dyn KvStore,
        user_id: &str,
        thread_id: &str,
    ) -> Result<ThreadMessages> {
        let key = keys::thread_messages_key(user_id, thread_id);
        let messages = store
            .lrange(&key, 0, -1)?
            .iter()
            .rev()
            .map(|raw| {
                codec::decode_value::<StoredMessage>(&key, raw)?
                    .into_message()
                    .map_err(|e| StoreError::decode(key.as_str(), e))
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(user_id, thread_id, count = messages.len(), "read thread messages");
        Ok(ThreadMessages { messages })
    }

    /// Append a message the way the chat-history writer does. Returns the
    /// new list length.
    pub fn append_thread_message(
        store: &dyn KvStore,
        user_id: &str,
        thread_id: &str,
        message: &Message,
    ) -> Result<i64> {
        let stored = message.to_stored().map_err(StoreError::Encode)?;
        let key = keys::thread_messages_key(user_id, thread_id);
        let len = store
            .execute(Batch::new().lpush(key, codec::encode_value(&stored)?))?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::UnexpectedReply("empty reply to LPUSH".into()))?
            .into_integer()?;
        debug!(user_id, thread_id, len, "appended thread message");
        Ok(len)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
