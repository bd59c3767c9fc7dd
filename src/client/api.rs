//! HTTP access to the chat service.

use crate::api::auth::schemas::{AuthResponse, LoginRequest, SignupRequest, UserEnvelope};
use crate::api::chat::schemas::{
    ChatDetail, ChatEnvelope, ChatHistory, SendMessageRequest, SendMessageResponse,
};
use crate::client::error::ClientError;
use crate::core::account::User;
use async_trait::async_trait;
use log::debug;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::RwLock;
use uuid::Uuid;

#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Creates an account and keeps the issued token.
    async fn signup(&self, name: &str, email: &str, password: &str) -> Result<User, ClientError>;

    /// Logs in and keeps the issued token.
    async fn login(&self, email: &str, password: &str) -> Result<User, ClientError>;

    /// The user owning the current token.
    async fn me(&self) -> Result<User, ClientError>;

    async fn logout(&self) -> Result<(), ClientError>;

    async fn history(&self, page: u32, limit: u32) -> Result<ChatHistory, ClientError>;

    async fn chat(&self, chat_id: Uuid) -> Result<ChatDetail, ClientError>;

    async fn send(
        &self,
        text: &str,
        chat_id: Option<Uuid>,
    ) -> Result<SendMessageResponse, ClientError>;

    async fn delete_chat(&self, chat_id: Uuid) -> Result<(), ClientError>;

    fn set_token(&self, token: Option<String>);

    fn has_token(&self) -> bool;
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

pub struct HttpChatApi {
    client: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl HttpChatApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            token: RwLock::new(None),
        }
    }

    pub fn with_token(self, token: impl Into<String>) -> Self {
        self.set_token(Some(token.into()));
        self
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{path}", self.base_url));

        match self.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn read<T: DeserializeOwned>(&self, response: Response) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .map(|body| body.message)
            .unwrap_or_default();
        debug!("request failed with {status}: {message}");

        Err(match status {
            StatusCode::BAD_REQUEST => ClientError::Validation(message),
            StatusCode::UNAUTHORIZED => {
                self.set_token(None);
                ClientError::Unauthorized(message)
            }
            StatusCode::NOT_FOUND => ClientError::NotFound(message),
            _ => ClientError::Server {
                status: status.as_u16(),
                message,
            },
        })
    }

    fn keep(&self, response: AuthResponse) -> User {
        self.set_token(Some(response.token));
        response.user
    }
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn signup(&self, name: &str, email: &str, password: &str) -> Result<User, ClientError> {
        let body = SignupRequest {
            name: name.to_owned(),
            email: email.to_owned(),
            password: password.to_owned(),
        };
        let response = self
            .request(Method::POST, "/auth/signup")
            .json(&body)
            .send()
            .await?;

        Ok(self.keep(self.read(response).await?))
    }

    async fn login(&self, email: &str, password: &str) -> Result<User, ClientError> {
        let body = LoginRequest {
            email: email.to_owned(),
            password: password.to_owned(),
        };
        let response = self
            .request(Method::POST, "/auth/login")
            .json(&body)
            .send()
            .await?;

        Ok(self.keep(self.read(response).await?))
    }

    async fn me(&self) -> Result<User, ClientError> {
        let response = self.request(Method::GET, "/auth/me").send().await?;
        let envelope: UserEnvelope = self.read(response).await?;
        Ok(envelope.user)
    }

    async fn logout(&self) -> Result<(), ClientError> {
        let response = self.request(Method::POST, "/auth/logout").send().await;
        self.set_token(None);
        self.read::<serde_json::Value>(response?).await?;
        Ok(())
    }

    async fn history(&self, page: u32, limit: u32) -> Result<ChatHistory, ClientError> {
        let response = self
            .request(Method::GET, "/chat/history")
            .query(&[("page", page), ("limit", limit)])
            .send()
            .await?;

        self.read(response).await
    }

    async fn chat(&self, chat_id: Uuid) -> Result<ChatDetail, ClientError> {
        let response = self
            .request(Method::GET, &format!("/chat/{chat_id}"))
            .send()
            .await?;
        let envelope: ChatEnvelope = self.read(response).await?;
        Ok(envelope.chat)
    }

    async fn send(
        &self,
        text: &str,
        chat_id: Option<Uuid>,
    ) -> Result<SendMessageResponse, ClientError> {
        let body = SendMessageRequest {
            message: text.to_owned(),
            chat_id: chat_id.map(|id| id.to_string()),
        };
        let response = self
            .request(Method::POST, "/chat/send")
            .json(&body)
            .send()
            .await?;

        self.read(response).await
    }

    async fn delete_chat(&self, chat_id: Uuid) -> Result<(), ClientError> {
        let response = self
            .request(Method::DELETE, &format!("/chat/{chat_id}"))
            .send()
            .await?;
        self.read::<serde_json::Value>(response).await?;
        Ok(())
    }

    fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = token;
    }

    fn has_token(&self) -> bool {
        self.token.read().unwrap_or_else(|e| e.into_inner()).is_some()
    }
}
