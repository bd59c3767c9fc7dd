//! DI "Interfaces"

use crate::core::account::{AuthSession, User};
use crate::core::chat::{Chat, ChatSummary, Message};
use crate::core::error::ServiceError;
use async_trait::async_trait;
use uuid::Uuid;

/// Result of a message exchange.
#[derive(Debug, Clone)]
pub struct SendOutcome {
    pub chat_id: Uuid,
    pub reply: String,
    pub messages: Vec<Message>,
}

/// One page of a user's chat summaries.
#[derive(Debug, Clone)]
pub struct ChatPage {
    pub chats: Vec<ChatSummary>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

impl ChatPage {
    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.page_size.max(1)))
    }
}

#[async_trait]
pub trait ChatService: Send + Sync {
    /// Appends a user message to a chat (creating the chat when `chat_id` is
    /// `None`), asks the completion provider for a reply, appends it, and saves.
    ///
    /// Returns `Err` for empty messages and for chats the user does not own.
    /// Completion failures never surface here; a fallback reply is stored.
    async fn send_message(
        &self,
        user_id: Uuid,
        text: &str,
        chat_id: Option<Uuid>,
    ) -> Result<SendOutcome, ServiceError>;

    /// Lists the user's chats, most recently active first.
    async fn list_chats(
        &self,
        user_id: Uuid,
        page: u32,
        page_size: u32,
    ) -> Result<ChatPage, ServiceError>;

    /// Loads a chat with all of its messages.
    ///
    /// Returns `Err` if the chat does not exist or belongs to someone else.
    async fn get_chat(&self, user_id: Uuid, chat_id: Uuid) -> Result<Chat, ServiceError>;

    /// Deletes a chat and its messages.
    ///
    /// Returns `Err` if the chat did not exist or the user didn't own it.
    async fn delete_chat(&self, user_id: Uuid, chat_id: Uuid) -> Result<(), ServiceError>;
}

#[async_trait]
pub trait AuthService: Send + Sync {
    async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, ServiceError>;

    async fn login(&self, email: &str, password: &str) -> Result<AuthSession, ServiceError>;

    /// Resolves a bearer token to its user.
    async fn authenticate(&self, token: &str) -> Result<User, ServiceError>;

    async fn logout(&self, token: &str) -> Result<(), ServiceError>;
}
