//! Chat message model for thread message lists.
//!
//! Thread messages are written by the chat-history writer as an envelope
//! `{"type": <kind>, "data": {...}}` ([`StoredMessage`]). Readers unwrap the
//! envelope into a flat [`Message`] whose `type` field carries the kind:
//!
//! ```json
//! {"type": "human", "data": {"content": "hi", "additional_kwargs": {}, "type": "human", "example": false}}
//! ```
//!
//! The outer `type` is authoritative; the copy inside `data` may be missing
//! in older entries.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ─────────────────────────────────────────────────────────────────────────────
// Message kind and content
// ─────────────────────────────────────────────────────────────────────────────

/// Who produced a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// End-user input.
    Human,
    /// Model output.
    Ai,
    /// System prompt.
    System,
    /// Message with an arbitrary `role`.
    Chat,
    /// Legacy function-call result.
    Function,
    /// Tool-call result.
    Tool,
}

impl MessageKind {
    /// Wire name of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Human => "human",
            Self::Ai => "ai",
            Self::System => "system",
            Self::Chat => "chat",
            Self::Function => "function",
            Self::Tool => "tool",
        }
    }
}

/// Message content: plain text or a list of content parts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain text.
    Text(String),
    /// Multi-part content (text blocks, image URLs, ...), kept as raw JSON.
    Parts(Vec<Value>),
}

impl MessageContent {
    /// Concatenated text of the content.
    ///
    /// Parts contribute their `text` field when they have one.
    pub fn text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    Value::String(s) => Some(s.as_str()),
                    other => other.get("text").and_then(Value::as_str),
                })
                .collect(),
        }
    }
}

impl From<&str> for MessageContent {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for MessageContent {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Message
// ─────────────────────────────────────────────────────────────────────────────

/// A decoded thread message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message body.
    pub content: MessageContent,
    /// Provider-specific extras (function calls, tool calls, ...).
    #[serde(default)]
    pub additional_kwargs: Map<String, Value>,
    /// Message kind.
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// Whether the message is a few-shot example (human/ai only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<bool>,
    /// Function or tool name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Speaker role for [`MessageKind::Chat`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Tool call this message answers ([`MessageKind::Tool`]).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Fields owned by the writer that this model does not name (`id`,
    /// `tool_calls`, `response_metadata`, ...). Kept as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Message {
    fn new(kind: MessageKind, content: MessageContent) -> Self {
        let example = matches!(kind, MessageKind::Human | MessageKind::Ai).then_some(false);
        Self {
            content,
            additional_kwargs: Map::new(),
            kind,
            example,
            name: None,
            role: None,
            tool_call_id: None,
            extra: Map::new(),
        }
    }

    /// A human message.
    pub fn human(content: impl Into<MessageContent>) -> Self {
        Self::new(MessageKind::Human, content.into())
    }

    /// An AI message.
    pub fn ai(content: impl Into<MessageContent>) -> Self {
        Self::new(MessageKind::Ai, content.into())
    }

    /// A system message.
    pub fn system(content: impl Into<MessageContent>) -> Self {
        Self::new(MessageKind::System, content.into())
    }

    /// A chat message with an explicit role.
    pub fn chat(role: impl Into<String>, content: impl Into<MessageContent>) -> Self {
        Self {
            role: Some(role.into()),
            ..Self::new(MessageKind::Chat, content.into())
        }
    }

    /// A function result message.
    pub fn function(name: impl Into<String>, content: impl Into<MessageContent>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new(MessageKind::Function, content.into())
        }
    }

    /// A tool result message.
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<MessageContent>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::new(MessageKind::Tool, content.into())
        }
    }

    /// Wrap the message in its stored envelope.
    pub fn to_stored(&self) -> serde_json::Result<StoredMessage> {
        Ok(StoredMessage {
            kind: self.kind,
            data: serde_json::to_value(self)?,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Stored envelope
// ─────────────────────────────────────────────────────────────────────────────

/// The envelope a message list entry is stored as.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    /// Message kind; selects how `data` is interpreted.
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// Message fields.
    pub data: Value,
}

impl StoredMessage {
    /// Unwrap the envelope into a [`Message`].
    ///
    /// The envelope's `type` overrides any `type` inside `data`.
    pub fn into_message(self) -> serde_json::Result<Message> {
        let mut data = self.data;
        if let Value::Object(ref mut fields) = data {
            let _ = fields.insert("type".into(), Value::String(self.kind.as_str().into()));
        }
        serde_json::from_value(data)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
