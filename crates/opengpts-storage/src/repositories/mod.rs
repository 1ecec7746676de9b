//! Entity repositories.
//!
//! Each repository is a stateless struct whose methods take a `&dyn KvStore`.
//! Assistants and threads share one layout (an index set of ids plus one
//! detail hash per id), implemented once by the helpers here.

pub mod assistant;
pub mod message;
pub mod thread;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::codec::{self, RawValue};
use crate::errors::{Result, StoreError};
use crate::kv::{Batch, KvStore};

pub use assistant::AssistantRepo;
pub use message::MessageRepo;
pub use thread::ThreadRepo;

/// Read every record indexed under `index_key`, one `HMGET` per id in a
/// single batch. Records come back in index iteration order.
fn list_records<T: DeserializeOwned>(
    store: &dyn KvStore,
    user_id: &str,
    index_key: &str,
    detail_key: impl Fn(&str) -> String,
    fields: &[&str],
) -> Result<Vec<T>> {
    let ids = store
        .smembers(index_key)?
        .iter()
        .map(|raw| codec::decode_value::<String>(index_key, raw))
        .collect::<Result<Vec<_>>>()?;
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let keys: Vec<String> = ids.iter().map(|id| detail_key(id)).collect();
    let batch = keys
        .iter()
        .fold(Batch::new(), |batch, key| batch.hmget(key.as_str(), fields));
    let replies = store.execute(batch)?;
    if replies.len() != keys.len() {
        return Err(StoreError::UnexpectedReply(format!(
            "sent {} reads, got {} replies",
            keys.len(),
            replies.len()
        )));
    }

    keys.iter()
        .zip(replies)
        .map(|(key, reply)| decode_record(user_id, key, fields, reply.into_values()?))
        .collect()
}

/// Read one detail hash. `None` when every field is absent.
fn get_record<T: DeserializeOwned>(
    store: &dyn KvStore,
    user_id: &str,
    key: &str,
    fields: &[&str],
) -> Result<Option<T>> {
    let reply = store
        .execute(Batch::new().hmget(key, fields))?
        .into_iter()
        .next()
        .ok_or_else(|| StoreError::UnexpectedReply("empty reply to HMGET".into()))?;
    let raw = reply.into_values()?;
    if raw.iter().all(Option::is_none) {
        return Ok(None);
    }
    decode_record(user_id, key, fields, raw).map(Some)
}

/// Add `id` to the index set and overwrite the detail hash, in one batch.
fn put_record<T: Serialize>(
    store: &dyn KvStore,
    index_key: &str,
    id: &str,
    detail_key: &str,
    record: &T,
) -> Result<()> {
    let Value::Object(fields) = serde_json::to_value(record).map_err(StoreError::Encode)? else {
        return Err(StoreError::Encode(serde::ser::Error::custom(
            "record did not serialize to an object",
        )));
    };
    let batch = Batch::new()
        .sadd(index_key, codec::encode_value(id)?)
        .hset(detail_key, codec::encode(&fields)?);
    let _ = store.execute(batch)?;
    Ok(())
}

fn decode_record<T: DeserializeOwned>(
    user_id: &str,
    key: &str,
    fields: &[&str],
    raw: Vec<RawValue>,
) -> Result<T> {
    let mut map = codec::decode(fields, raw)?;
    let _ = map.insert("user_id".into(), Value::String(user_id.to_string()));
    serde_json::from_value(Value::Object(map)).map_err(|e| StoreError::decode(key, e))
}
