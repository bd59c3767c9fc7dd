//! Conversion of service errors into HTTP responses.
//!
//! Client-facing errors expose their message. Persistence failures are logged
//! with full detail and answered with a generic message.

use crate::core::error::ServiceError;
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::error;
use serde_json::json;

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Persistence(_) | ServiceError::PasswordHash(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<JsonRejection> for ServiceError {
    fn from(rejection: JsonRejection) -> Self {
        ServiceError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ServiceError {
    fn from(rejection: QueryRejection) -> Self {
        ServiceError::Validation(rejection.body_text())
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            ServiceError::Persistence(e) => {
                error!("database error: {e}");
                "Internal server error".to_owned()
            }
            ServiceError::PasswordHash(e) => {
                error!("password hashing failed: {e}");
                "Internal server error".to_owned()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_client_errors_expose_message() {
        let response = ServiceError::chat_not_found().into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_of(response).await["message"], "Chat not found");

        let response = ServiceError::Validation("Message cannot be empty".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_of(response).await["message"], "Message cannot be empty");
    }

    #[tokio::test]
    async fn test_persistence_errors_are_generic() {
        let response = ServiceError::Persistence(sqlx::Error::PoolTimedOut).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(response).await["message"], "Internal server error");
    }

    #[tokio::test]
    async fn test_query_rejection_is_a_validation_error() {
        let uri: axum::http::Uri = "/chat/history?page=abc".parse().unwrap();
        let rejection =
            axum::extract::Query::<crate::api::chat::schemas::HistoryQuery>::try_from_uri(&uri)
                .unwrap_err();

        let response = ServiceError::from(rejection).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_of(response).await;
        assert!(!body["message"].as_str().unwrap().is_empty());
    }
}
