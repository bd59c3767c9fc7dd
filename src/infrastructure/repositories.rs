//! DB Repository abstractions

use crate::core::chat;
use crate::infrastructure::database::DatabaseConnection;
use crate::infrastructure::entities::{self, Message, Session, User};
use crate::infrastructure::traits::{ChatRepository, UserRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use di::{Ref, injectable};
use uuid::Uuid;

#[injectable(ChatRepository)]
pub struct DbChatRepository {
    connection: Ref<DatabaseConnection>,
}

impl DbChatRepository {
    pub fn new(connection: Ref<DatabaseConnection>) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl ChatRepository for DbChatRepository {
    async fn find_owned_by_id(
        &self,
        chat_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<chat::Chat>, sqlx::Error> {
        let row: Option<entities::Chat> = sqlx::query_as(
            "SELECT id, user_id, title, created_at, last_message_at FROM chats WHERE id = ? AND user_id = ?",
        )
        .bind(chat_id)
        .bind(user_id)
        .fetch_optional(&**self.connection)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let messages: Vec<Message> = sqlx::query_as(
            "SELECT chat_id, position, role, content, timestamp FROM messages WHERE chat_id = ? ORDER BY position ASC",
        )
        .bind(row.id)
        .fetch_all(&**self.connection)
        .await?;

        Ok(Some(chat::Chat {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            created_at: row.created_at,
            last_message_at: row.last_message_at,
            messages: messages.into_iter().map(chat::Message::from).collect(),
        }))
    }

    async fn list_summaries_by_user(
        &self,
        user_id: Uuid,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<chat::ChatSummary>, sqlx::Error> {
        let offset = i64::from(page.max(1) - 1) * i64::from(page_size);

        let rows: Vec<entities::Chat> = sqlx::query_as(
            "SELECT id, user_id, title, created_at, last_message_at FROM chats WHERE user_id = ? ORDER BY julianday(last_message_at) DESC, rowid DESC LIMIT ? OFFSET ?",
        )
        .bind(user_id)
        .bind(i64::from(page_size))
        .bind(offset)
        .fetch_all(&**self.connection)
        .await?;

        Ok(rows.into_iter().map(chat::ChatSummary::from).collect())
    }

    async fn count_by_user(&self, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chats WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&**self.connection)
            .await?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn save(&self, chat: &chat::Chat) -> Result<(), sqlx::Error> {
        let mut tx = self.connection.begin().await?;

        let upserted = sqlx::query(
            "INSERT INTO chats (id, user_id, title, created_at, last_message_at) VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT (id) DO UPDATE SET title = excluded.title, last_message_at = excluded.last_message_at \
             WHERE chats.user_id = excluded.user_id",
        )
        .bind(chat.id)
        .bind(chat.user_id)
        .bind(&chat.title)
        .bind(chat.created_at)
        .bind(chat.last_message_at)
        .execute(&mut *tx)
        .await?;

        if upserted.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        sqlx::query("DELETE FROM messages WHERE chat_id = ?")
            .bind(chat.id)
            .execute(&mut *tx)
            .await?;

        for (position, message) in chat.messages.iter().enumerate() {
            sqlx::query(
                "INSERT INTO messages (chat_id, position, role, content, timestamp) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(chat.id)
            .bind(position as i64)
            .bind(entities::MessageRole::from(message.role))
            .bind(&message.content)
            .bind(message.timestamp)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await
    }

    async fn delete_owned_by_id(&self, chat_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM chats WHERE id = ? AND user_id = ?")
            .bind(chat_id)
            .bind(user_id)
            .execute(&**self.connection)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[injectable(UserRepository)]
pub struct DbUserRepository {
    connection: Ref<DatabaseConnection>,
}

impl DbUserRepository {
    pub fn new(connection: Ref<DatabaseConnection>) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl UserRepository for DbUserRepository {
    async fn create_user(&self, user: User) -> Result<User, sqlx::Error> {
        sqlx::query_as(
            "INSERT INTO users (id, email, name, password_hash, created_at) VALUES (?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(user.id)
        .bind(user.email)
        .bind(user.name)
        .bind(user.password_hash)
        .bind(user.created_at)
        .fetch_one(&**self.connection)
        .await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&**self.connection)
            .await
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&**self.connection)
            .await
    }

    async fn create_session(&self, session: Session) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO sessions (token_hash, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(session.token_hash)
        .bind(session.user_id)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&**self.connection)
        .await?;

        Ok(())
    }

    async fn find_session_user(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as(
            "SELECT users.id, users.email, users.name, users.password_hash, users.created_at FROM sessions INNER JOIN users ON users.id = sessions.user_id WHERE sessions.token_hash = ? AND julianday(sessions.expires_at) > julianday(?)",
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&**self.connection)
        .await
    }

    async fn delete_session(&self, token_hash: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(token_hash)
            .execute(&**self.connection)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE julianday(expires_at) <= julianday(?)")
            .bind(now)
            .execute(&**self.connection)
            .await?;

        Ok(result.rows_affected())
    }
}
