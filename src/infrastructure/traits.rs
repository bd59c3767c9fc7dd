//! Infrastructure traits, used for DI on higher levels

use crate::core::chat;
use crate::infrastructure::entities;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Chat documents. Every operation is scoped by owner so that a guessed id
/// never reaches another user's chat.
#[async_trait]
pub trait ChatRepository: Send + Sync {
    async fn find_owned_by_id(
        &self,
        chat_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<chat::Chat>, sqlx::Error>;

    /// Summaries sorted by `last_message_at`, newest first. `page` starts at 1.
    async fn list_summaries_by_user(
        &self,
        user_id: Uuid,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<chat::ChatSummary>, sqlx::Error>;

    async fn count_by_user(&self, user_id: Uuid) -> Result<u64, sqlx::Error>;

    /// Inserts or replaces the chat and its whole message sequence.
    ///
    /// Concurrent saves of one chat are last-write-wins. Saving over a chat
    /// owned by another user fails with `RowNotFound`.
    async fn save(&self, chat: &chat::Chat) -> Result<(), sqlx::Error>;

    /// Returns `true` if a chat was removed.
    async fn delete_owned_by_id(&self, chat_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, user: entities::User) -> Result<entities::User, sqlx::Error>;

    async fn find_by_email(&self, email: &str) -> Result<Option<entities::User>, sqlx::Error>;

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<entities::User>, sqlx::Error>;

    async fn create_session(&self, session: entities::Session) -> Result<(), sqlx::Error>;

    /// The owner of an unexpired session.
    async fn find_session_user(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<entities::User>, sqlx::Error>;

    async fn delete_session(&self, token_hash: &str) -> Result<bool, sqlx::Error>;

    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, sqlx::Error>;
}
