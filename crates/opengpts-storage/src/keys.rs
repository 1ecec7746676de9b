//! Key-space layout.
//!
//! Every key embeds the user id, so one user's keys can never address
//! another user's records.
//!
//! | Key | Type |
//! |---|---|
//! | `opengpts:{user_id}:assistants` | set of encoded assistant ids |
//! | `opengpts:{user_id}:assistant:{assistant_id}` | hash |
//! | `opengpts:{user_id}:threads` | set of encoded thread ids |
//! | `opengpts:{user_id}:thread:{thread_id}` | hash |
//! | `message_store:{user_id}:{thread_id}` | list, newest first |
//!
//! The message list keeps the `message_store:` prefix the chat-history writer
//! uses; it is not ours to rename.

const PREFIX: &str = "opengpts";
const MESSAGE_PREFIX: &str = "message_store";

/// Index set of a user's assistant ids.
pub fn assistants_list_key(user_id: &str) -> String {
    format!("{PREFIX}:{user_id}:assistants")
}

/// Detail hash of one assistant.
pub fn assistant_key(user_id: &str, assistant_id: &str) -> String {
    format!("{PREFIX}:{user_id}:assistant:{assistant_id}")
}

/// Index set of a user's thread ids.
pub fn threads_list_key(user_id: &str) -> String {
    format!("{PREFIX}:{user_id}:threads")
}

/// Detail hash of one thread.
pub fn thread_key(user_id: &str, thread_id: &str) -> String {
    format!("{PREFIX}:{user_id}:thread:{thread_id}")
}

/// Message list of one thread.
pub fn thread_messages_key(user_id: &str, thread_id: &str) -> String {
    format!("{MESSAGE_PREFIX}:{user_id}:{thread_id}")
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn wire_format() {
        assert_eq!(assistants_list_key("123"), "opengpts:123:assistants");
        assert_eq!(
            assistant_key("123", "i-am-a-test"),
            "opengpts:123:assistant:i-am-a-test"
        );
        assert_eq!(threads_list_key("123"), "opengpts:123:threads");
        assert_eq!(thread_key("123", "t1"), "opengpts:123:thread:t1");
        assert_eq!(thread_messages_key("123", "t1"), "message_store:123:t1");
    }

    proptest! {
        #[test]
        fn keys_are_deterministic(user in "[a-z0-9]{1,12}", id in "[a-z0-9-]{1,12}") {
            prop_assert_eq!(assistant_key(&user, &id), assistant_key(&user, &id));
            prop_assert_eq!(thread_messages_key(&user, &id), thread_messages_key(&user, &id));
        }

        #[test]
        fn distinct_users_never_share_keys(
            a in "[a-z0-9]{1,12}",
            b in "[a-z0-9]{1,12}",
            id in "[a-z0-9-]{1,12}",
        ) {
            prop_assume!(a != b);
            prop_assert_ne!(assistants_list_key(&a), assistants_list_key(&b));
            prop_assert_ne!(assistant_key(&a, &id), assistant_key(&b, &id));
            prop_assert_ne!(threads_list_key(&a), threads_list_key(&b));
            prop_assert_ne!(thread_key(&a, &id), thread_key(&b, &id));
            prop_assert_ne!(thread_messages_key(&a, &id), thread_messages_key(&b, &id));
        }

        #[test]
        fn entity_kinds_never_collide(user in "[a-z0-9]{1,12}", id in "[a-z0-9-]{1,12}") {
            prop_assert_ne!(assistant_key(&user, &id), thread_key(&user, &id));
            prop_assert_ne!(assistants_list_key(&user), threads_list_key(&user));
        }
    }
}
