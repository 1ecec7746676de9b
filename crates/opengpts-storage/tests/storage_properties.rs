//! Repository behaviour against every built-in backend.

#![allow(missing_docs, unused_results)]

use std::sync::Arc;

use opengpts_core::Message;
use opengpts_storage::codec;
use opengpts_storage::keys;
use opengpts_storage::kv::sqlite::ConnectionConfig;
use opengpts_storage::{AssistantRecord, Batch, KvStore, MemoryStore, SqliteStore, Storage};
use proptest::prelude::*;
use serde_json::{Value, json};

/// One storage per backend. The tempdir keeps the file-backed database alive.
fn backends() -> (tempfile::TempDir, Vec<(&'static str, Storage)>) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.db");
    let file = SqliteStore::open_file(path.to_str().unwrap(), &ConnectionConfig::default()).unwrap();
    let stores: Vec<(&'static str, Arc<dyn KvStore>)> = vec![
        ("memory", Arc::new(MemoryStore::new())),
        ("sqlite-memory", Arc::new(SqliteStore::open_in_memory().unwrap())),
        ("sqlite-file", Arc::new(file)),
    ];
    let storages = stores
        .into_iter()
        .map(|(name, store)| (name, Storage::new(store)))
        .collect();
    (dir, storages)
}

#[test]
fn put_then_list_end_to_end() {
    let (_dir, backends) = backends();
    for (name, storage) in backends {
        let saved = storage
            .put_assistant("123", "i-am-a-test", "Test Agent", json!({"tags": ["hello"]}))
            .unwrap();
        let listed = storage.list_assistants("123").unwrap();
        assert_eq!(
            listed,
            vec![AssistantRecord {
                user_id: "123".into(),
                assistant_id: Some("i-am-a-test".into()),
                name: Some("Test Agent".into()),
                config: Some(json!({"tags": ["hello"]})),
                updated_at: Some(saved.updated_at),
            }],
            "{name}"
        );
    }
}

#[test]
fn updated_at_never_goes_backwards() {
    let (_dir, backends) = backends();
    for (name, storage) in backends {
        let mut last = None;
        for i in 0..5 {
            let _ = storage
                .put_assistant("u", "a", &format!("v{i}"), json!(i))
                .unwrap();
            let record = storage.get_assistant("u", "a").unwrap().unwrap();
            let at = record.updated_at.unwrap();
            if let Some(prev) = last {
                assert!(at >= prev, "{name}");
            }
            last = Some(at);
        }
    }
}

#[test]
fn repeated_put_keeps_one_index_entry() {
    let (_dir, backends) = backends();
    for (name, storage) in backends {
        storage.put_assistant("u", "a", "A", json!({})).unwrap();
        storage.put_assistant("u", "a", "A", json!({})).unwrap();
        storage.put_thread("u", "t", "a", "T").unwrap();
        storage.put_thread("u", "t", "a", "T").unwrap();
        let index = storage.store().smembers(&keys::assistants_list_key("u")).unwrap();
        assert_eq!(index, vec![codec::encode_value("a").unwrap()], "{name}");
        assert_eq!(storage.list_threads("u").unwrap().len(), 1, "{name}");
    }
}

#[test]
fn users_never_see_each_other() {
    let (_dir, backends) = backends();
    for (name, storage) in backends {
        storage.put_assistant("A", "x", "A's", json!(null)).unwrap();
        storage.put_thread("A", "t", "x", "A's thread").unwrap();
        storage
            .append_thread_message("A", "t", &Message::human("secret"))
            .unwrap();

        assert!(storage.list_assistants("B").unwrap().is_empty(), "{name}");
        assert!(storage.list_threads("B").unwrap().is_empty(), "{name}");
        assert!(storage.get_assistant("B", "x").unwrap().is_none(), "{name}");
        assert!(
            storage.get_thread_messages("B", "t").unwrap().messages.is_empty(),
            "{name}"
        );
    }
}

#[test]
fn messages_read_in_append_order() {
    let (_dir, backends) = backends();
    for (name, storage) in backends {
        let sent = vec![
            Message::human("m1"),
            Message::ai("m2"),
            Message::human("m3"),
        ];
        for m in &sent {
            storage.append_thread_message("u", "t", m).unwrap();
        }
        let raw = storage
            .store()
            .lrange(&keys::thread_messages_key("u", "t"), 0, 0)
            .unwrap();
        let newest: Value = serde_json::from_slice(&raw[0]).unwrap();
        assert_eq!(newest["data"]["content"], "m3", "{name}");

        assert_eq!(storage.get_thread_messages("u", "t").unwrap().messages, sent, "{name}");
    }
}

#[test]
fn indexed_id_without_detail_hash() {
    let (_dir, backends) = backends();
    for (name, storage) in backends {
        storage
            .store()
            .execute(Batch::new().sadd(
                keys::assistants_list_key("u"),
                codec::encode_value("orphan").unwrap(),
            ))
            .unwrap();
        let listed = storage.list_assistants("u").unwrap();
        assert_eq!(listed.len(), 1, "{name}");
        let record = &listed[0];
        assert_eq!(record.user_id, "u");
        assert!(record.name.is_none(), "{name}");
        assert!(record.config.is_none(), "{name}");
        assert!(record.updated_at.is_none(), "{name}");
        assert!(storage.get_assistant("u", "orphan").unwrap().is_none(), "{name}");
    }
}

#[test]
fn threads_reference_assistants_loosely() {
    let (_dir, backends) = backends();
    for (name, storage) in backends {
        let thread = storage.put_thread("u", "t", "missing", "T").unwrap();
        let listed = storage.list_threads("u").unwrap();
        assert_eq!(listed.len(), 1, "{name}");
        assert_eq!(listed[0].assistant_id.as_deref(), Some("missing"), "{name}");
        assert_eq!(listed[0].thread_id.as_deref(), Some("t"), "{name}");
        assert_eq!(listed[0].updated_at, Some(thread.updated_at), "{name}");
    }
}

#[test]
fn corrupt_bytes_are_integrity_errors() {
    let (_dir, backends) = backends();
    for (name, storage) in backends {
        storage
            .store()
            .execute(
                Batch::new()
                    .sadd(keys::threads_list_key("u"), codec::encode_value("t").unwrap())
                    .hset(
                        keys::thread_key("u", "t"),
                        vec![("name".into(), Some(b"\xff\xfe".to_vec()))],
                    )
                    .lpush(keys::thread_messages_key("u", "t"), b"{".to_vec()),
            )
            .unwrap();
        assert!(storage.list_threads("u").unwrap_err().is_data_integrity(), "{name}");
        assert!(
            storage.get_thread_messages("u", "t").unwrap_err().is_data_integrity(),
            "{name}"
        );
    }
}

fn config_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        "[a-zA-Z0-9 ]{0,12}".prop_map(Value::String),
    ];
    leaf.prop_recursive(2, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn any_assistant_survives_put_and_list(
        user_id in "[a-z0-9]{1,8}",
        assistant_id in "[a-z0-9-]{1,12}",
        name in ".{0,20}",
        config in config_value(),
    ) {
        let storage = Storage::new(Arc::new(MemoryStore::new()));
        let saved = storage.put_assistant(&user_id, &assistant_id, &name, config.clone()).unwrap();
        let listed = storage.list_assistants(&user_id).unwrap();
        prop_assert_eq!(listed.len(), 1);
        let record = &listed[0];
        prop_assert_eq!(record.assistant_id.as_deref(), Some(assistant_id.as_str()));
        prop_assert_eq!(record.name.as_deref(), Some(name.as_str()));
        // A null config is stored as an absent field.
        let expected = if config.is_null() { None } else { Some(config) };
        prop_assert_eq!(record.config.clone(), expected);
        prop_assert_eq!(record.updated_at, Some(saved.updated_at));
    }
}
