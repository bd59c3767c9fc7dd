//! Chat session controller.
//!
//! Each operation dispatches its "requested" action, awaits the API without
//! holding the store lock, then dispatches the outcome.

use crate::client::api::ChatApi;
use crate::client::error::ClientError;
use crate::client::forms::{LoginForm, SignupForm};
use crate::client::store::{Action, SessionState, Store};
use crate::core::account::User;
use crate::core::chat::{ChatSummary, Message, Role};
use chrono::Utc;
use log::warn;
use std::sync::Arc;
use uuid::Uuid;

const HISTORY_PAGE_SIZE: u32 = 20;

pub struct ChatSessionController {
    api: Arc<dyn ChatApi>,
    store: Store,
}

impl ChatSessionController {
    pub fn new(api: Arc<dyn ChatApi>, store: Store) -> Self {
        Self { api, store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn state(&self) -> SessionState {
        self.store.snapshot()
    }

    /// Loads the first page of chat summaries once per session.
    ///
    /// Returns `Ok(false)` without a request when history is already loaded
    /// or a load is in flight.
    pub async fn load_history(&self) -> Result<bool, ClientError> {
        let idle = |s: &SessionState| !s.history_loaded && !s.loading;
        if !self.store.dispatch_if(idle, Action::HistoryRequested) {
            return Ok(false);
        }

        match self.api.history(1, HISTORY_PAGE_SIZE).await {
            Ok(history) => {
                self.store.dispatch(Action::HistoryLoaded(history.chats));
                Ok(true)
            }
            Err(e) => {
                self.store.dispatch(Action::HistoryFailed(e.to_string()));
                Err(e)
            }
        }
    }

    pub async fn select_chat(&self, chat: ChatSummary) -> Result<(), ClientError> {
        let chat_id = chat.id;
        self.store.dispatch(Action::ChatSelected(chat));
        self.load_messages(chat_id).await
    }

    pub async fn load_messages(&self, chat_id: Uuid) -> Result<(), ClientError> {
        self.store.dispatch(Action::MessagesRequested);

        match self.api.chat(chat_id).await {
            Ok(chat) => {
                self.store.dispatch(Action::MessagesLoaded(chat.messages));
                Ok(())
            }
            Err(e) => {
                self.store.dispatch(Action::MessagesFailed(e.to_string()));
                Err(e)
            }
        }
    }

    pub fn start_new_chat(&self) {
        self.store.dispatch(Action::NewChatStarted);
    }

    /// Sends `text` to `chat_id`, or to a new chat when `None`.
    ///
    /// The user message shows up immediately and is removed again if the
    /// request fails. Blank text is rejected without touching the state.
    pub async fn send_message(
        &self,
        text: &str,
        chat_id: Option<Uuid>,
    ) -> Result<Uuid, ClientError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ClientError::Validation("Message cannot be empty".to_owned()));
        }

        self.store.dispatch(Action::UserMessageAdded(Message::new(
            Role::User,
            trimmed,
            Utc::now(),
        )));
        self.store.dispatch(Action::SendRequested);

        match self.api.send(trimmed, chat_id).await {
            Ok(response) => {
                let chat_id = response.chat_id;
                self.store.dispatch(Action::SendSucceeded {
                    chat_id,
                    messages: response.messages,
                    now: Utc::now(),
                });
                Ok(chat_id)
            }
            Err(e) => {
                self.store.dispatch(Action::SendFailed(e.to_string()));
                Err(e)
            }
        }
    }

    pub async fn delete_chat(&self, chat_id: Uuid) -> Result<(), ClientError> {
        match self.api.delete_chat(chat_id).await {
            Ok(()) => {
                self.store.dispatch(Action::ChatDeleted(chat_id));
                Ok(())
            }
            Err(e) => {
                self.store.dispatch(Action::DeleteFailed(e.to_string()));
                Err(e)
            }
        }
    }

    pub fn clear_error(&self) {
        self.store.dispatch(Action::ErrorCleared);
    }

    pub fn set_typing(&self, typing: bool) {
        self.store.dispatch(Action::TypingSet(typing));
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, ClientError> {
        let form = LoginForm::new(email, password);
        form.check()?;

        let user = self.api.login(&form.email, &form.password).await?;
        self.store.dispatch(Action::SignedIn(user.clone()));
        Ok(user)
    }

    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<User, ClientError> {
        let form = SignupForm::new(name, email, password, confirm_password);
        form.check()?;

        let user = self
            .api
            .signup(&form.name, &form.email, &form.password)
            .await?;
        self.store.dispatch(Action::SignedIn(user.clone()));
        Ok(user)
    }

    /// Resolves a stored token back into a signed-in user.
    ///
    /// Returns `Ok(None)` when there is no token. Any failure drops the token.
    pub async fn restore_session(&self) -> Result<Option<User>, ClientError> {
        if !self.api.has_token() {
            return Ok(None);
        }

        match self.api.me().await {
            Ok(user) => {
                self.store.dispatch(Action::SignedIn(user.clone()));
                Ok(Some(user))
            }
            Err(e) => {
                self.api.set_token(None);
                Err(e)
            }
        }
    }

    pub async fn logout(&self) {
        if let Err(e) = self.api.logout().await {
            warn!("server logout failed: {e}");
        }
        self.api.set_token(None);
        self.store.dispatch(Action::SignedOut);
    }
}
