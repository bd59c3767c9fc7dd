//! Database entities

use crate::core::account;
use crate::core::chat;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, FromRow)]
pub struct Chat {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub last_message_at: DateTime<Utc>,
}

impl From<Chat> for chat::ChatSummary {
    fn from(chat: Chat) -> Self {
        chat::ChatSummary {
            id: chat.id,
            title: chat.title,
            last_message_at: chat.last_message_at,
            created_at: chat.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl From<chat::Role> for MessageRole {
    fn from(role: chat::Role) -> Self {
        match role {
            chat::Role::User => MessageRole::User,
            chat::Role::Assistant => MessageRole::Assistant,
        }
    }
}

impl From<MessageRole> for chat::Role {
    fn from(role: MessageRole) -> Self {
        match role {
            MessageRole::User => chat::Role::User,
            MessageRole::Assistant => chat::Role::Assistant,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct Message {
    pub chat_id: Uuid,
    pub position: i64,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl From<Message> for chat::Message {
    fn from(message: Message) -> Self {
        chat::Message {
            role: message.role.into(),
            content: message.content,
            timestamp: message.timestamp,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for account::User {
    fn from(user: User) -> Self {
        account::User {
            id: user.id,
            email: user.email,
            name: user.name,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct Session {
    pub token_hash: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
