//! Message Types
//!
//! Transcript types shared by the client, the controller and every surface.
//! The wire format is the Delphi backend's: `{ "text": ..., "sender": "USER" | "CLONE" }`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Placeholder text shown while the backend is working
pub const PLACEHOLDER_TEXT: &str = "please wait...";

/// Opaque, server-issued conversation identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    /// Wrap a server-issued id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who authored a message
///
/// The backend only distinguishes the user from everything else, so any
/// sender string other than `"USER"` is read as the clone side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Sender {
    /// The selected demo user
    User,
    /// The hosted AI clone
    Clone,
}

impl Sender {
    /// Wire representation
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Sender::User => "USER",
            Sender::Clone => "CLONE",
        }
    }
}

impl From<String> for Sender {
    fn from(value: String) -> Self {
        if value == "USER" {
            Sender::User
        } else {
            Sender::Clone
        }
    }
}

impl From<Sender> for String {
    fn from(sender: Sender) -> Self {
        sender.as_str().to_string()
    }
}

/// A single transcript entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message body, may contain `[n]` callout markers
    pub text: String,
    /// Author
    pub sender: Sender,
}

impl Message {
    /// Create a message from the user
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::User,
        }
    }

    /// Create a message from the clone
    pub fn clone_reply(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::Clone,
        }
    }

    /// The "please wait..." placeholder shown during a round-trip
    #[must_use]
    pub fn placeholder() -> Self {
        Self::clone_reply(PLACEHOLDER_TEXT)
    }

    /// Whether the user wrote this message
    #[must_use]
    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }

    /// Whether this is the round-trip placeholder
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.sender == Sender::Clone && self.text == PLACEHOLDER_TEXT
    }
}

/// Number of user-authored messages in a transcript
#[must_use]
pub fn count_user_messages(messages: &[Message]) -> usize {
    messages.iter().filter(|m| m.is_user()).count()
}

/// A conversation as returned by the backend
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conversation {
    /// Server-issued id
    pub conversation_id: ConversationId,
    /// Ordered transcript
    pub history: Vec<Message>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sender_wire_format() {
        let json = serde_json::to_string(&Message::user("hi")).unwrap();
        assert_eq!(json, r#"{"text":"hi","sender":"USER"}"#);

        let msg: Message = serde_json::from_str(r#"{"text":"yo","sender":"CLONE"}"#).unwrap();
        assert_eq!(msg, Message::clone_reply("yo"));
    }

    #[test]
    fn test_unknown_sender_is_clone_side() {
        let msg: Message =
            serde_json::from_str(r#"{"text":"note","sender":"SYSTEM","extra":1}"#).unwrap();
        assert_eq!(msg.sender, Sender::Clone);
    }

    #[test]
    fn test_placeholder() {
        let p = Message::placeholder();
        assert!(p.is_placeholder());
        assert!(!p.is_user());
        assert!(!Message::user(PLACEHOLDER_TEXT).is_placeholder());
    }

    #[test]
    fn test_count_user_messages() {
        let transcript = vec![
            Message::clone_reply("hello"),
            Message::user("hi"),
            Message::clone_reply("how can I help?"),
            Message::user("how are you"),
        ];
        assert_eq!(count_user_messages(&transcript), 2);
        assert_eq!(count_user_messages(&[]), 0);
    }

    #[test]
    fn test_conversation_id_is_transparent() {
        let id = ConversationId::new("abc-123");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""abc-123""#);
        assert_eq!(id.to_string(), "abc-123");
    }
}
