//! Shared types for the Parley voice/chat front end.
//!
//! This crate holds the data model every other Parley crate agrees on:
//! transcript messages and their identifiers, the inbound session events
//! produced by a voice-agent client, the connection state machine labels,
//! and the local device controls.
//!
//! Nothing here performs I/O. Keeping the model in its own crate lets the
//! transcript, voice, session, and server crates depend on it without
//! depending on each other.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

mod controls;
mod event;

pub use controls::{Control, DeviceControls, ParseControlError};
pub use event::SessionEvent;

/// Who authored a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    /// The local human participant (voice transcript or typed text).
    User,
    /// The remote voice agent.
    Assistant,
}

impl Sender {
    /// Returns the string label for this sender.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque message identifier.
///
/// Backed by a random v4 UUID, so identifiers are never reused within or
/// across sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    /// Generates a fresh identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for MessageId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A single chat bubble in the conversation transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Identifier assigned at creation.
    pub id: MessageId,
    /// Message body. Grows in place while an assistant turn is streaming.
    pub text: String,
    /// Author of the message.
    pub sender: Sender,
    /// When the message was created.
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Creates a message with a fresh identifier stamped with the current time.
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            text: text.into(),
            sender,
            created_at: Utc::now(),
        }
    }

    /// Shorthand for a user-authored message.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    /// Shorthand for an assistant-authored message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Sender::Assistant, text)
    }
}

/// Connection state of the voice session as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No session. The initial state, and the state after a failed connect.
    #[default]
    Disconnected,
    /// A connect request is in flight.
    Connecting,
    /// The client reported a live session.
    Connected,
}

impl ConnectionState {
    /// Returns the string label for this state.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        }
    }

    /// Whether the session is live.
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_ids_are_unique() {
        let a = Message::user("hi");
        let b = Message::user("hi");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn message_id_parses_its_display_form() {
        let id = MessageId::new();
        let parsed: MessageId = id.to_string().parse().expect("id should parse");
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<MessageId>().is_err());
    }

    #[test]
    fn message_serializes_with_camel_case_fields() {
        let msg = Message::assistant("Hello!");
        let json = serde_json::to_value(&msg).expect("message should serialize");
        assert_eq!(json["sender"], "assistant");
        assert_eq!(json["text"], "Hello!");
        assert!(json.get("createdAt").is_some());
        assert_eq!(json["id"], msg.id.to_string());
    }

    #[test]
    fn connection_state_labels() {
        assert_eq!(ConnectionState::default(), ConnectionState::Disconnected);
        assert_eq!(ConnectionState::Connecting.as_str(), "connecting");
        assert!(ConnectionState::Connected.is_connected());
        assert!(!ConnectionState::Connecting.is_connected());
    }
}
