//! Assistant repository: index set plus one detail hash per assistant.

use chrono::{SubsecRound, Utc};
use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::keys;
use crate::kv::KvStore;
use crate::types::{ASSISTANT_FIELDS, Assistant, AssistantRecord};

/// Assistant repository. Stateless; every method takes the store.
pub struct AssistantRepo;

impl AssistantRepo {
    /// All assistants indexed for `user_id`, in index iteration order.
    ///
    /// An indexed id without a detail hash yields a record with every
    /// field `None`.
    pub fn list(store: &dyn KvStore, user_id: &str) -> Result<Vec<AssistantRecord>> {
        let records = super::list_records(
            store,
            user_id,
            &keys::assistants_list_key(user_id),
            |id| keys::assistant_key(user_id, id),
            &ASSISTANT_FIELDS,
        )?;
        debug!(user_id, count = records.len(), "listed assistants");
        Ok(records)
    }

    /// One assistant, or `None` if it has no detail hash.
    pub fn get(
        store: &dyn KvStore,
        user_id: &str,
        assistant_id: &str,
    ) -> Result<Option<AssistantRecord>> {
        super::get_record(
            store,
            user_id,
            &keys::assistant_key(user_id, assistant_id),
            &ASSISTANT_FIELDS,
        )
    }

    /// Create or overwrite an assistant, stamping `updated_at` with the
    /// current time.
    pub fn put(
        store: &dyn KvStore,
        user_id: &str,
        assistant_id: &str,
        name: &str,
        config: Value,
    ) -> Result<Assistant> {
        let assistant = Assistant {
            user_id: user_id.to_string(),
            assistant_id: assistant_id.to_string(),
            name: name.to_string(),
            config,
            updated_at: Utc::now().trunc_subsecs(6),
        };
        super::put_record(
            store,
            &keys::assistants_list_key(user_id),
            assistant_id,
            &keys::assistant_key(user_id, assistant_id),
            &assistant,
        )?;
        debug!(user_id, assistant_id, "saved assistant");
        Ok(assistant)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
