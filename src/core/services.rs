//! Implementations for the service the app needs.
//!

use crate::config::AppConfig;
use crate::core::account::{self, AuthSession, LoginAttempt, NewAccount, User};
use crate::core::assistant::{ChatMessage, CompletionProvider, FALLBACK_REPLY};
use crate::core::chat::{Chat, Role};
use crate::core::credentials;
use crate::core::error::ServiceError;
use crate::core::traits::{AuthService, ChatPage, ChatService, SendOutcome};
use crate::infrastructure::entities;
use crate::infrastructure::traits::{ChatRepository, UserRepository};
use async_trait::async_trait;
use chrono::Utc;
use di::{Ref, injectable};
use log::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

pub const MAX_PAGE_SIZE: u32 = 100;

/// Trimmed message text, rejected when blank.
pub fn message_content(text: &str) -> Result<&str, ServiceError> {
    let content = text.trim();
    if content.is_empty() {
        return Err(ServiceError::Validation(
            "Message cannot be empty".to_owned(),
        ));
    }
    Ok(content)
}

#[injectable(ChatService)]
pub struct MyChatService {
    repo: Ref<dyn ChatRepository>,
    assistant: Ref<dyn CompletionProvider>,
}

impl MyChatService {
    /// Asks the provider for a reply, substituting the fallback on any failure.
    async fn generate_reply(&self, chat: &Chat) -> String {
        let prompt: Vec<ChatMessage> = chat.messages.iter().map(ChatMessage::from).collect();

        match self.assistant.complete(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("completion failed for chat {}: {e}", chat.id);
                FALLBACK_REPLY.to_owned()
            }
        }
    }
}

#[async_trait]
impl ChatService for MyChatService {
    async fn send_message(
        &self,
        user_id: Uuid,
        text: &str,
        chat_id: Option<Uuid>,
    ) -> Result<SendOutcome, ServiceError> {
        let content = message_content(text)?;

        let mut chat = match chat_id {
            Some(chat_id) => self
                .repo
                .find_owned_by_id(chat_id, user_id)
                .await?
                .ok_or_else(ServiceError::chat_not_found)?,
            None => Chat::start(user_id, text, Utc::now()),
        };

        chat.push(Role::User, content, Utc::now());

        let reply = self.generate_reply(&chat).await;

        let now = Utc::now();
        chat.push(Role::Assistant, reply.clone(), now);
        chat.last_message_at = now;

        self.repo.save(&chat).await?;
        debug!(
            "chat {} saved with {} messages",
            chat.id,
            chat.messages.len()
        );

        Ok(SendOutcome {
            chat_id: chat.id,
            reply,
            messages: chat.messages,
        })
    }

    async fn list_chats(
        &self,
        user_id: Uuid,
        page: u32,
        page_size: u32,
    ) -> Result<ChatPage, ServiceError> {
        let page = page.max(1);
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);

        let chats = self
            .repo
            .list_summaries_by_user(user_id, page, page_size)
            .await?;
        let total = self.repo.count_by_user(user_id).await?;

        Ok(ChatPage {
            chats,
            total,
            page,
            page_size,
        })
    }

    async fn get_chat(&self, user_id: Uuid, chat_id: Uuid) -> Result<Chat, ServiceError> {
        self.repo
            .find_owned_by_id(chat_id, user_id)
            .await?
            .ok_or_else(ServiceError::chat_not_found)
    }

    async fn delete_chat(&self, user_id: Uuid, chat_id: Uuid) -> Result<(), ServiceError> {
        if self.repo.delete_owned_by_id(chat_id, user_id).await? {
            info!("chat {chat_id} deleted");
            Ok(())
        } else {
            Err(ServiceError::chat_not_found())
        }
    }
}

#[injectable(AuthService)]
pub struct MyAuthService {
    users: Ref<dyn UserRepository>,
    config: Ref<AppConfig>,
}

impl MyAuthService {
    async fn issue_session(&self, user: entities::User) -> Result<AuthSession, ServiceError> {
        let now = Utc::now();
        let token = credentials::generate_token();

        let purged = self.users.purge_expired_sessions(now).await?;
        if purged > 0 {
            debug!("purged {purged} expired sessions");
        }

        self.users
            .create_session(entities::Session {
                token_hash: credentials::hash_token(&token),
                user_id: user.id,
                created_at: now,
                expires_at: now + self.config.session_ttl,
            })
            .await?;

        Ok(AuthSession {
            token,
            user: user.into(),
        })
    }
}

fn invalid_credentials() -> ServiceError {
    ServiceError::Unauthorized("Invalid credentials".to_owned())
}

#[async_trait]
impl AuthService for MyAuthService {
    async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, ServiceError> {
        let account = NewAccount::new(name, email, password);
        account
            .validate()
            .map_err(|e| ServiceError::Validation(account::validation_message(&e)))?;

        if self.users.find_by_email(&account.email).await?.is_some() {
            return Err(ServiceError::Conflict(
                "User already exists with this email".to_owned(),
            ));
        }

        let password_hash =
            credentials::hash_password(&account.password).map_err(ServiceError::PasswordHash)?;

        let created = self
            .users
            .create_user(entities::User {
                id: Uuid::new_v4(),
                email: account.email,
                name: account.name,
                password_hash,
                created_at: Utc::now(),
            })
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    ServiceError::Conflict("User already exists with this email".to_owned())
                }
                e => ServiceError::Persistence(e),
            })?;

        info!("user {} signed up", created.id);
        self.issue_session(created).await
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthSession, ServiceError> {
        let attempt = LoginAttempt::new(email, password);
        attempt
            .validate()
            .map_err(|e| ServiceError::Validation(account::validation_message(&e)))?;

        let user = self
            .users
            .find_by_email(&attempt.email)
            .await?
            .ok_or_else(invalid_credentials)?;

        if !credentials::verify_password(&user.password_hash, &attempt.password) {
            return Err(invalid_credentials());
        }

        self.issue_session(user).await
    }

    async fn authenticate(&self, token: &str) -> Result<User, ServiceError> {
        self.users
            .find_session_user(&credentials::hash_token(token), Utc::now())
            .await?
            .map(User::from)
            .ok_or_else(|| ServiceError::Unauthorized("Token is not valid".to_owned()))
    }

    async fn logout(&self, token: &str) -> Result<(), ServiceError> {
        self.users
            .delete_session(&credentials::hash_token(token))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::assistant::{CompletionError, ConnectionStatus};
    use crate::core::chat::ChatSummary;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct MemoryChats {
        chats: Mutex<HashMap<Uuid, Chat>>,
        saves: AtomicUsize,
    }

    #[async_trait]
    impl ChatRepository for MemoryChats {
        async fn find_owned_by_id(
            &self,
            chat_id: Uuid,
            user_id: Uuid,
        ) -> Result<Option<Chat>, sqlx::Error> {
            let chats = self.chats.lock().unwrap();
            Ok(chats
                .get(&chat_id)
                .filter(|chat| chat.user_id == user_id)
                .cloned())
        }

        async fn list_summaries_by_user(
            &self,
            user_id: Uuid,
            page: u32,
            page_size: u32,
        ) -> Result<Vec<ChatSummary>, sqlx::Error> {
            let chats = self.chats.lock().unwrap();
            let mut owned: Vec<ChatSummary> = chats
                .values()
                .filter(|chat| chat.user_id == user_id)
                .map(Chat::summary)
                .collect();
            owned.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
            Ok(owned
                .into_iter()
                .skip(((page - 1) * page_size) as usize)
                .take(page_size as usize)
                .collect())
        }

        async fn count_by_user(&self, user_id: Uuid) -> Result<u64, sqlx::Error> {
            let chats = self.chats.lock().unwrap();
            Ok(chats.values().filter(|chat| chat.user_id == user_id).count() as u64)
        }

        async fn save(&self, chat: &Chat) -> Result<(), sqlx::Error> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            self.chats.lock().unwrap().insert(chat.id, chat.clone());
            Ok(())
        }

        async fn delete_owned_by_id(
            &self,
            chat_id: Uuid,
            user_id: Uuid,
        ) -> Result<bool, sqlx::Error> {
            let mut chats = self.chats.lock().unwrap();
            match chats.get(&chat_id) {
                Some(chat) if chat.user_id == user_id => {
                    chats.remove(&chat_id);
                    Ok(true)
                }
                _ => Ok(false),
            }
        }
    }

    struct ScriptedAssistant {
        reply: Option<&'static str>,
        calls: AtomicUsize,
        last_prompt_len: AtomicUsize,
    }

    impl ScriptedAssistant {
        fn replying(reply: &'static str) -> Self {
            Self {
                reply: Some(reply),
                calls: AtomicUsize::new(0),
                last_prompt_len: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                reply: None,
                calls: AtomicUsize::new(0),
                last_prompt_len: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedAssistant {
        async fn complete(&self, messages: &[ChatMessage]) -> Result<String, CompletionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.last_prompt_len.store(messages.len(), Ordering::SeqCst);
            match self.reply {
                Some(reply) => Ok(reply.to_owned()),
                None => Err(CompletionError::Status {
                    status: 503,
                    body: "upstream down".to_owned(),
                }),
            }
        }

        async fn check_connection(&self) -> ConnectionStatus {
            ConnectionStatus {
                connected: self.reply.is_some(),
                service: "scripted",
                model: "scripted".to_owned(),
                error: None,
            }
        }
    }

    fn service(
        repo: &Ref<MemoryChats>,
        assistant: &Ref<ScriptedAssistant>,
    ) -> MyChatService {
        MyChatService {
            repo: repo.clone(),
            assistant: assistant.clone(),
        }
    }

    #[tokio::test]
    async fn test_first_message_creates_titled_chat() {
        let repo = Ref::new(MemoryChats::default());
        let assistant = Ref::new(ScriptedAssistant::replying("Hi! How can I help?"));
        let chats = service(&repo, &assistant);
        let user = Uuid::new_v4();

        let outcome = chats.send_message(user, "Hello", None).await.unwrap();

        assert_eq!(outcome.reply, "Hi! How can I help?");
        assert_eq!(outcome.messages.len(), 2);
        assert_eq!(outcome.messages[0].role, Role::User);
        assert_eq!(outcome.messages[0].content, "Hello");
        assert_eq!(outcome.messages[1].role, Role::Assistant);

        let stored = chats.get_chat(user, outcome.chat_id).await.unwrap();
        assert_eq!(stored.title, "Hello");
        assert_eq!(stored.last_message_at, stored.messages[1].timestamp);
    }

    #[tokio::test]
    async fn test_provider_failure_stores_fallback_reply() {
        let repo = Ref::new(MemoryChats::default());
        let assistant = Ref::new(ScriptedAssistant::failing());
        let chats = service(&repo, &assistant);

        let outcome = chats
            .send_message(Uuid::new_v4(), "Is anyone there?", None)
            .await
            .unwrap();

        assert_eq!(outcome.reply, FALLBACK_REPLY);
        assert_eq!(outcome.messages.len(), 2);
        assert_eq!(repo.saves.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_each_send_appends_exactly_two_messages() {
        let repo = Ref::new(MemoryChats::default());
        let assistant = Ref::new(ScriptedAssistant::replying("Sure."));
        let chats = service(&repo, &assistant);
        let user = Uuid::new_v4();

        let first = chats.send_message(user, "One", None).await.unwrap();
        let second = chats
            .send_message(user, "Two", Some(first.chat_id))
            .await
            .unwrap();

        assert_eq!(second.chat_id, first.chat_id);
        assert_eq!(second.messages.len(), 4);
        // the whole history goes to the provider
        assert_eq!(assistant.last_prompt_len.load(Ordering::SeqCst), 3);

        let stored = chats.get_chat(user, first.chat_id).await.unwrap();
        assert_eq!(stored.title, "One");
    }

    #[tokio::test]
    async fn test_whitespace_message_is_rejected_before_any_work() {
        let repo = Ref::new(MemoryChats::default());
        let assistant = Ref::new(ScriptedAssistant::replying("unused"));
        let chats = service(&repo, &assistant);

        let result = chats.send_message(Uuid::new_v4(), " \n\t ", None).await;

        assert!(matches!(result, Err(ServiceError::Validation(_))));
        assert_eq!(assistant.calls.load(Ordering::SeqCst), 0);
        assert_eq!(repo.saves.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_user_message_is_stored_trimmed() {
        let repo = Ref::new(MemoryChats::default());
        let assistant = Ref::new(ScriptedAssistant::replying("ok"));
        let chats = service(&repo, &assistant);

        let outcome = chats
            .send_message(Uuid::new_v4(), "  refund please  ", None)
            .await
            .unwrap();

        assert_eq!(outcome.messages[0].content, "refund please");
    }

    #[tokio::test]
    async fn test_cannot_append_to_another_users_chat() {
        let repo = Ref::new(MemoryChats::default());
        let assistant = Ref::new(ScriptedAssistant::replying("ok"));
        let chats = service(&repo, &assistant);
        let owner = Uuid::new_v4();

        let outcome = chats.send_message(owner, "mine", None).await.unwrap();
        let result = chats
            .send_message(Uuid::new_v4(), "sneaky", Some(outcome.chat_id))
            .await;

        assert!(matches!(result, Err(ServiceError::NotFound(_))));
        assert_eq!(assistant.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            chats.get_chat(owner, outcome.chat_id).await.unwrap().messages.len(),
            2
        );
    }

    #[tokio::test]
    async fn test_deleted_chat_is_not_found_afterwards() {
        let repo = Ref::new(MemoryChats::default());
        let assistant = Ref::new(ScriptedAssistant::replying("ok"));
        let chats = service(&repo, &assistant);
        let user = Uuid::new_v4();

        let outcome = chats.send_message(user, "bye", None).await.unwrap();
        chats.delete_chat(user, outcome.chat_id).await.unwrap();

        assert!(matches!(
            chats.get_chat(user, outcome.chat_id).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            chats.delete_chat(user, outcome.chat_id).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_chats_clamps_paging() {
        let repo = Ref::new(MemoryChats::default());
        let assistant = Ref::new(ScriptedAssistant::replying("ok"));
        let chats = service(&repo, &assistant);
        let user = Uuid::new_v4();

        for text in ["a", "b", "c"] {
            chats.send_message(user, text, None).await.unwrap();
        }

        let page = chats.list_chats(user, 0, 1000).await.unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, MAX_PAGE_SIZE);
        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages(), 1);
        assert_eq!(page.chats[0].title, "c");

        let page = chats.list_chats(user, 2, 2).await.unwrap();
        assert_eq!(page.chats.len(), 1);
        assert_eq!(page.total_pages(), 2);
    }
}
