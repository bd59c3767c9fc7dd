//! Chat endpoints

use crate::api::{BearerToken, JsonBody, QueryParams};
use crate::api::chat::schemas::{
    ChatDetail, ChatEnvelope, ChatHistory, HistoryQuery, SendMessageRequest, SendMessageResponse,
    StatusMessage,
};
use crate::core::error::ServiceError;
use crate::core::services::message_content;
use crate::core::traits::{AuthService, ChatService};
use axum::extract::Path;
use axum::routing::{get, post};
use axum::{Json, Router};
use di_axum::Inject;
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: u32 = 10;

pub fn router() -> Router {
    Router::new()
        .route("/send", post(send_message))
        .route("/history", get(history))
        .route("/:chat_id", get(get_chat).delete(delete_chat))
}

/// A malformed id cannot name an existing chat.
fn parse_chat_id(raw: &str) -> Result<Uuid, ServiceError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ServiceError::chat_not_found())
}

async fn send_message(
    Inject(auth_service): Inject<dyn AuthService>,
    Inject(chat_service): Inject<dyn ChatService>,
    BearerToken(token): BearerToken,
    JsonBody(request): JsonBody<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, ServiceError> {
    let user = auth_service.authenticate(&token).await?;
    message_content(&request.message)?;

    let chat_id = match request.chat_id.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(parse_chat_id(raw)?),
    };

    let outcome = chat_service
        .send_message(user.id, &request.message, chat_id)
        .await?;

    Ok(Json(SendMessageResponse {
        message: "Message sent successfully".to_owned(),
        chat_id: outcome.chat_id,
        ai_response: outcome.reply,
        messages: outcome.messages,
    }))
}

async fn history(
    Inject(auth_service): Inject<dyn AuthService>,
    Inject(chat_service): Inject<dyn ChatService>,
    BearerToken(token): BearerToken,
    QueryParams(query): QueryParams<HistoryQuery>,
) -> Result<Json<ChatHistory>, ServiceError> {
    let user = auth_service.authenticate(&token).await?;

    let page = chat_service
        .list_chats(
            user.id,
            query.page.unwrap_or(1),
            query.limit.unwrap_or(DEFAULT_PAGE_SIZE),
        )
        .await?;

    Ok(Json(ChatHistory {
        message: "Chat history retrieved successfully".to_owned(),
        total_pages: page.total_pages(),
        current_page: page.page,
        total: page.total,
        chats: page.chats,
    }))
}

async fn get_chat(
    Inject(auth_service): Inject<dyn AuthService>,
    Inject(chat_service): Inject<dyn ChatService>,
    BearerToken(token): BearerToken,
    Path(chat_id): Path<String>,
) -> Result<Json<ChatEnvelope>, ServiceError> {
    let user = auth_service.authenticate(&token).await?;
    let chat = chat_service
        .get_chat(user.id, parse_chat_id(&chat_id)?)
        .await?;

    Ok(Json(ChatEnvelope {
        chat: ChatDetail::from(chat),
    }))
}

async fn delete_chat(
    Inject(auth_service): Inject<dyn AuthService>,
    Inject(chat_service): Inject<dyn ChatService>,
    BearerToken(token): BearerToken,
    Path(chat_id): Path<String>,
) -> Result<Json<StatusMessage>, ServiceError> {
    let user = auth_service.authenticate(&token).await?;
    chat_service
        .delete_chat(user.id, parse_chat_id(&chat_id)?)
        .await?;

    Ok(Json(StatusMessage {
        message: "Chat deleted successfully".to_owned(),
    }))
}

pub mod schemas {
    use crate::core::chat::{self, ChatSummary, Message};
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Serialize, Deserialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct SendMessageRequest {
        #[serde(default)]
        pub message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub chat_id: Option<String>,
    }

    #[derive(Serialize, Deserialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct SendMessageResponse {
        #[serde(default)]
        pub message: String,
        pub chat_id: Uuid,
        pub ai_response: String,
        pub messages: Vec<Message>,
    }

    #[derive(Deserialize, Debug, Default)]
    pub struct HistoryQuery {
        pub page: Option<u32>,
        pub limit: Option<u32>,
    }

    #[derive(Serialize, Deserialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct ChatHistory {
        #[serde(default)]
        pub message: String,
        pub chats: Vec<ChatSummary>,
        pub total_pages: u64,
        pub current_page: u32,
        pub total: u64,
    }

    #[derive(Serialize, Deserialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct ChatDetail {
        pub id: Uuid,
        pub title: String,
        pub messages: Vec<Message>,
        pub created_at: DateTime<Utc>,
        pub last_message_at: DateTime<Utc>,
    }

    impl From<chat::Chat> for ChatDetail {
        fn from(chat: chat::Chat) -> Self {
            ChatDetail {
                id: chat.id,
                title: chat.title,
                messages: chat.messages,
                created_at: chat.created_at,
                last_message_at: chat.last_message_at,
            }
        }
    }

    #[derive(Serialize, Deserialize, Debug)]
    pub struct ChatEnvelope {
        pub chat: ChatDetail,
    }

    #[derive(Serialize, Deserialize, Debug)]
    pub struct StatusMessage {
        pub message: String,
    }
}
