//! In-memory [`KvStore`] for tests and local development.
//!
//! Holds typed entries behind one `parking_lot::RwLock`; a batch takes the
//! write lock once, so concurrent readers never see it half-applied. A
//! failing command stops the batch but keeps earlier writes. Using a key with a command
//! of another type fails with [`StoreError::WrongType`], as in Redis.

use std::collections::{HashMap, VecDeque};

use parking_lot::RwLock;

use super::{Batch, Command, KvStore, Reply, resolve_range};
use crate::codec::RawValue;
use crate::errors::{Result, StoreError};

#[derive(Debug)]
enum Entry {
    /// Members in first-insertion order.
    Set(Vec<Vec<u8>>),
    Hash(HashMap<String, Vec<u8>>),
    List(VecDeque<Vec<u8>>),
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held.
    pub fn key_count(&self) -> usize {
        self.entries.read().len()
    }
}

fn wrong_type(key: &str, expected: &'static str) -> StoreError {
    StoreError::WrongType {
        key: key.to_string(),
        expected,
    }
}

fn apply(entries: &mut HashMap<String, Entry>, command: Command) -> Result<Reply> {
    match command {
        Command::SAdd { key, member } => {
            let entry = entries
                .entry(key.clone())
                .or_insert_with(|| Entry::Set(Vec::new()));
            let Entry::Set(set) = entry else {
                return Err(wrong_type(&key, "set"));
            };
            if set.contains(&member) {
                return Ok(Reply::Integer(0));
            }
            set.push(member);
            Ok(Reply::Integer(1))
        }
        Command::HSet { key, fields } => {
            let entry = entries
                .entry(key.clone())
                .or_insert_with(|| Entry::Hash(HashMap::new()));
            let Entry::Hash(hash) = entry else {
                return Err(wrong_type(&key, "hash"));
            };
            for (field, value) in fields {
                match value {
                    Some(bytes) => {
                        let _ = hash.insert(field, bytes);
                    }
                    None => {
                        let _ = hash.remove(&field);
                    }
                }
            }
            if hash.is_empty() {
                let _ = entries.remove(&key);
            }
            Ok(Reply::Ok)
        }
        Command::HMGet { key, fields } => {
            let values: Vec<RawValue> = match entries.get(&key) {
                None => vec![None; fields.len()],
                Some(Entry::Hash(hash)) => fields.iter().map(|f| hash.get(f).cloned()).collect(),
                Some(_) => return Err(wrong_type(&key, "hash")),
            };
            Ok(Reply::Values(values))
        }
        Command::LPush { key, value } => {
            let entry = entries
                .entry(key.clone())
                .or_insert_with(|| Entry::List(VecDeque::new()));
            let Entry::List(list) = entry else {
                return Err(wrong_type(&key, "list"));
            };
            list.push_front(value);
            Ok(Reply::Integer(i64::try_from(list.len()).unwrap_or(i64::MAX)))
        }
    }
}

impl KvStore for MemoryStore {
    fn smembers(&self, key: &str) -> Result<Vec<Vec<u8>>> {
        match self.entries.read().get(key) {
            None => Ok(Vec::new()),
            Some(Entry::Set(set)) => Ok(set.iter().cloned().collect()),
            Some(_) => Err(wrong_type(key, "set")),
        }
    }

    fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<Vec<u8>>> {
        match self.entries.read().get(key) {
            None => Ok(Vec::new()),
            Some(Entry::List(list)) => Ok(resolve_range(list.len(), start, stop)
                .map(|range| list.range(range).cloned().collect())
                .unwrap_or_default()),
            Some(_) => Err(wrong_type(key, "list")),
        }
    }

    fn execute(&self, batch: Batch) -> Result<Vec<Reply>> {
        let mut entries = self.entries.write();
        batch
            .into_commands()
            .into_iter()
            .map(|command| apply(&mut entries, command))
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn sadd_dedupes() {
        let store = MemoryStore::new();
        let replies = store
            .execute(Batch::new().sadd("s", b"a".to_vec()).sadd("s", b"a".to_vec()))
            .unwrap();
        assert_eq!(replies, vec![Reply::Integer(1), Reply::Integer(0)]);
        assert_eq!(store.smembers("s").unwrap(), vec![b"a".to_vec()]);
    }

    #[test]
    fn smembers_keeps_first_insertion_order() {
        let store = MemoryStore::new();
        let _ = store
            .execute(
                Batch::new()
                    .sadd("s", b"b".to_vec())
                    .sadd("s", b"a".to_vec())
                    .sadd("s", b"b".to_vec()),
            )
            .unwrap();
        assert_eq!(store.smembers("s").unwrap(), vec![b"b".to_vec(), b"a".to_vec()]);
    }

    #[test]
    fn smembers_missing_key_is_empty() {
        assert!(MemoryStore::new().smembers("nope").unwrap().is_empty());
    }

    #[test]
    fn hset_then_hmget() {
        let store = MemoryStore::new();
        let replies = store
            .execute(
                Batch::new()
                    .hset(
                        "h",
                        vec![
                            ("a".into(), Some(b"1".to_vec())),
                            ("b".into(), Some(b"2".to_vec())),
                        ],
                    )
                    .hmget("h", &["b", "missing", "a"]),
            )
            .unwrap();
        assert_eq!(replies[0], Reply::Ok);
        assert_eq!(
            replies[1],
            Reply::Values(vec![Some(b"2".to_vec()), None, Some(b"1".to_vec())])
        );
    }

    #[test]
    fn hset_none_deletes_field() {
        let store = MemoryStore::new();
        let _ = store
            .execute(Batch::new().hset(
                "h",
                vec![
                    ("a".into(), Some(b"1".to_vec())),
                    ("b".into(), Some(b"2".to_vec())),
                ],
            ))
            .unwrap();
        let replies = store
            .execute(
                Batch::new()
                    .hset("h", vec![("a".into(), None)])
                    .hmget("h", &["a", "b"]),
            )
            .unwrap();
        assert_eq!(replies[1], Reply::Values(vec![None, Some(b"2".to_vec())]));
    }

    #[test]
    fn hash_emptied_by_deletes_disappears() {
        let store = MemoryStore::new();
        let _ = store
            .execute(Batch::new().hset("h", vec![("a".into(), None)]))
            .unwrap();
        assert_eq!(store.key_count(), 0);
    }

    #[test]
    fn hmget_missing_hash_is_all_none() {
        let replies = MemoryStore::new()
            .execute(Batch::new().hmget("h", &["a", "b"]))
            .unwrap();
        assert_eq!(replies, vec![Reply::Values(vec![None, None])]);
    }

    #[test]
    fn lpush_prepends() {
        let store = MemoryStore::new();
        let replies = store
            .execute(
                Batch::new()
                    .lpush("l", b"1".to_vec())
                    .lpush("l", b"2".to_vec())
                    .lpush("l", b"3".to_vec()),
            )
            .unwrap();
        assert_eq!(replies.last(), Some(&Reply::Integer(3)));
        assert_eq!(
            store.lrange("l", 0, -1).unwrap(),
            vec![b"3".to_vec(), b"2".to_vec(), b"1".to_vec()]
        );
        assert_eq!(store.lrange("l", 0, 0).unwrap(), vec![b"3".to_vec()]);
        assert!(store.lrange("l", 5, 10).unwrap().is_empty());
    }

    #[test]
    fn wrong_type_is_reported() {
        let store = MemoryStore::new();
        let _ = store.execute(Batch::new().sadd("k", b"x".to_vec())).unwrap();
        assert_matches!(
            store.execute(Batch::new().hmget("k", &["f"])),
            Err(StoreError::WrongType { expected: "hash", .. })
        );
        assert_matches!(
            store.lrange("k", 0, -1),
            Err(StoreError::WrongType { expected: "list", .. })
        );
    }
}
