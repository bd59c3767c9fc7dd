//! Chat documents as seen by the services, the wire, and the client store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum number of characters of the first message kept in a chat title.
pub const TITLE_MAX_CHARS: usize = 50;

const TITLE_ELLIPSIS: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One turn of a chat. Owned by its chat, never edited after insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp,
        }
    }
}

/// A conversation with its full, ordered message sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Chat {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub last_message_at: DateTime<Utc>,
    pub messages: Vec<Message>,
}

impl Chat {
    /// Starts an unsaved chat whose title comes from its first message.
    pub fn start(user_id: Uuid, first_message: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: derive_title(first_message),
            created_at: now,
            last_message_at: now,
            messages: Vec::new(),
        }
    }

    pub fn push(&mut self, role: Role, content: impl Into<String>, timestamp: DateTime<Utc>) {
        self.messages.push(Message::new(role, content, timestamp));
    }

    pub fn summary(&self) -> ChatSummary {
        ChatSummary {
            id: self.id,
            title: self.title.clone(),
            last_message_at: self.last_message_at,
            created_at: self.created_at,
        }
    }
}

/// The list view of a chat, without its messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSummary {
    pub id: Uuid,
    pub title: String,
    pub last_message_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Title for a chat: the first [`TITLE_MAX_CHARS`] characters of `text`,
/// followed by `...` when anything was cut.
pub fn derive_title(text: &str) -> String {
    let mut chars = text.char_indices();

    match chars.nth(TITLE_MAX_CHARS) {
        Some((cut, _)) => format!("{}{TITLE_ELLIPSIS}", &text[..cut]),
        None => text.to_owned(),
    }
}
