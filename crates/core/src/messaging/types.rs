use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::operations::chat_id_for_personal_chats;

/// Delivery state of a message. Ordered so that `Sent < Received < Read`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReadState {
    #[default]
    Sent,
    Received,
    Read,
}

/// A single message inside a chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender: String,
    pub content: String,
    pub timestamp: NaiveDateTime,
    #[serde(default)]
    pub read_state: ReadState,
    /// Viewers that have read this message, keyed by normalized email.
    #[serde(default)]
    pub read_by_users: BTreeMap<String, bool>,
}

impl Message {
    /// Creates a freshly sent message that nobody has read yet.
    pub fn new(
        sender: impl Into<String>,
        content: impl Into<String>,
        timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            sender: sender.into(),
            content: content.into(),
            timestamp,
            read_state: ReadState::Sent,
            read_by_users: BTreeMap::new(),
        }
    }

    pub fn with_read_state(mut self, read_state: ReadState) -> Self {
        self.read_state = read_state;
        self
    }

    /// Number of viewers recorded as having read the message.
    pub fn read_count(&self) -> usize {
        self.read_by_users.values().filter(|read| **read).count()
    }
}

/// A conversation between two or more participants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: String,
    /// Emails of the participants.
    #[serde(default)]
    pub participants: Vec<String>,
    /// Messages in send order.
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Chat {
    /// Creates an empty chat with the given id and participants.
    pub fn new(id: impl Into<String>, participants: Vec<String>) -> Self {
        Self {
            id: id.into(),
            participants,
            messages: Vec::new(),
        }
    }

    /// Creates an empty one-to-one chat whose id is derived from both emails.
    pub fn personal(email1: &str, email2: &str) -> Self {
        Self::new(
            chat_id_for_personal_chats(email1, email2),
            vec![email1.to_string(), email2.to_string()],
        )
    }

    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}

/// One row of a user's contact list: a chat, its title and its latest message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRowInfo {
    pub chat_id: String,
    /// The other participant's full name, or the event name for a group chat.
    pub chat_title: String,
    #[serde(default)]
    pub last_message: Option<Message>,
    #[serde(default)]
    pub is_group_chat: bool,
}
