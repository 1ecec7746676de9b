//! # opengpts-core
//!
//! Shared vocabulary for the OpenGPTs storage crates:
//!
//! - **Messages**: [`Message`] and its stored envelope [`StoredMessage`], the
//!   record format written to thread message lists by the chat-history writer
//! - **Logging**: [`logging::init_subscriber`] for the `tracing` subscriber

#![deny(unsafe_code)]

pub mod logging;
pub mod messages;

pub use messages::{Message, MessageContent, MessageKind, StoredMessage};
