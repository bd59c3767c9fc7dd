//! Client session state and its reducer.

use crate::core::account::User;
use crate::core::chat::{self, ChatSummary, Message, Role};
use chrono::{DateTime, Utc};
use log::debug;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub user: Option<User>,
    pub chats: Vec<ChatSummary>,
    pub current_chat: Option<ChatSummary>,
    pub messages: Vec<Message>,
    pub loading: bool,
    pub sending: bool,
    pub typing: bool,
    pub history_loaded: bool,
    /// A new chat is being composed and has no id yet.
    pub draft: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub enum Action {
    HistoryRequested,
    HistoryLoaded(Vec<ChatSummary>),
    HistoryFailed(String),
    MessagesRequested,
    MessagesLoaded(Vec<Message>),
    MessagesFailed(String),
    ChatSelected(ChatSummary),
    NewChatStarted,
    /// Optimistic append, rolled back by `SendFailed`.
    UserMessageAdded(Message),
    SendRequested,
    SendSucceeded {
        chat_id: Uuid,
        messages: Vec<Message>,
        now: DateTime<Utc>,
    },
    SendFailed(String),
    ChatDeleted(Uuid),
    DeleteFailed(String),
    TypingSet(bool),
    ErrorCleared,
    SignedIn(User),
    SignedOut,
}

pub fn reduce(state: &mut SessionState, action: Action) {
    match action {
        Action::HistoryRequested => {
            state.loading = true;
            state.error = None;
        }
        Action::HistoryLoaded(chats) => {
            state.chats = chats;
            state.loading = false;
            state.history_loaded = true;
        }
        Action::HistoryFailed(error) => {
            state.loading = false;
            state.error = Some(error);
        }
        Action::MessagesRequested => {
            state.loading = true;
            state.error = None;
        }
        Action::MessagesLoaded(messages) => {
            state.messages = messages;
            state.loading = false;
        }
        Action::MessagesFailed(error) => {
            state.loading = false;
            state.error = Some(error);
        }
        Action::ChatSelected(chat) => {
            state.current_chat = Some(chat);
            state.draft = false;
        }
        Action::NewChatStarted => {
            state.current_chat = None;
            state.messages.clear();
            state.draft = true;
            state.error = None;
        }
        Action::UserMessageAdded(message) => state.messages.push(message),
        Action::SendRequested => {
            state.sending = true;
            state.typing = true;
            state.error = None;
        }
        Action::SendSucceeded {
            chat_id,
            messages,
            now,
        } => {
            let summary = updated_summary(state, chat_id, &messages, now);
            state.chats.retain(|chat| chat.id != chat_id);
            state.chats.insert(0, summary.clone());
            state.current_chat = Some(summary);
            state.messages = messages;
            state.sending = false;
            state.typing = false;
            state.draft = false;
        }
        Action::SendFailed(error) => {
            if state.messages.last().is_some_and(|m| m.role == Role::User) {
                state.messages.pop();
            }
            state.sending = false;
            state.typing = false;
            state.error = Some(error);
        }
        Action::ChatDeleted(chat_id) => {
            state.chats.retain(|chat| chat.id != chat_id);
            if state.current_chat.as_ref().is_some_and(|c| c.id == chat_id) {
                state.current_chat = None;
                state.messages.clear();
            }
        }
        Action::DeleteFailed(error) => state.error = Some(error),
        Action::TypingSet(typing) => state.typing = typing,
        Action::ErrorCleared => state.error = None,
        Action::SignedIn(user) => state.user = Some(user),
        Action::SignedOut => *state = SessionState::default(),
    }
}

/// Summary of `chat_id` after a successful send. The title follows the first
/// message while the chat holds only its first exchange.
fn updated_summary(
    state: &SessionState,
    chat_id: Uuid,
    messages: &[Message],
    now: DateTime<Utc>,
) -> ChatSummary {
    let derived = || messages.first().map(|m| chat::derive_title(&m.content));

    match state.chats.iter().find(|chat| chat.id == chat_id) {
        Some(existing) => ChatSummary {
            title: match messages.len() {
                2 => derived().unwrap_or_else(|| existing.title.clone()),
                _ => existing.title.clone(),
            },
            last_message_at: now,
            ..existing.clone()
        },
        None => ChatSummary {
            id: chat_id,
            title: derived().unwrap_or_else(|| "New Chat".to_owned()),
            last_message_at: now,
            created_at: now,
        },
    }
}

/// Shared handle to the session state. Every change goes through [`reduce`].
#[derive(Clone, Default)]
pub struct Store {
    state: Arc<Mutex<SessionState>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn dispatch(&self, action: Action) {
        debug!("dispatch {action:?}");
        reduce(&mut *self.lock(), action);
    }

    /// Dispatches `action` only if `guard` holds, checked under the same lock.
    pub fn dispatch_if<F>(&self, guard: F, action: Action) -> bool
    where
        F: FnOnce(&SessionState) -> bool,
    {
        let mut state = self.lock();
        if !guard(&*state) {
            return false;
        }
        debug!("dispatch {action:?}");
        reduce(&mut *state, action);
        true
    }

    pub fn snapshot(&self) -> SessionState {
        self.lock().clone()
    }
}
