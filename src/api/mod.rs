use crate::api::rate_limit::{RateLimiter, rate_limit_middleware};
use crate::config::{AppConfig, DEFAULT_CORS_ORIGIN};
use crate::core::error::ServiceError;
use async_trait::async_trait;
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{HeaderValue, Method, header};
use axum::routing::get;
use axum::{Json, Router, middleware};
use log::warn;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod chat;
pub mod error;
pub mod rate_limit;

const BEARER_PREFIX: &str = "Bearer ";

/// The raw bearer token of the request. Resolving it to a user is up to the
/// auth service.
#[derive(Debug)]
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, ServiceError> {
        let Some(value) = parts.headers.get(header::AUTHORIZATION) else {
            return Err(ServiceError::Unauthorized(
                "No token, authorization denied".to_owned(),
            ));
        };

        let token = value
            .to_str()
            .ok()
            .and_then(|v| v.strip_prefix(BEARER_PREFIX))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ServiceError::Unauthorized("Token is not valid".to_owned()))?;

        Ok(BearerToken(token.to_owned()))
    }
}

/// JSON request body whose rejections answer like every other service error.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ServiceError))]
pub struct JsonBody<T>(pub T);

/// Query string counterpart of [`JsonBody`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ServiceError))]
pub struct QueryParams<T>(pub T);

#[derive(Serialize, Deserialize, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_owned(),
        message: "AI Customer Support Server is running".to_owned(),
    })
}

/// All routes with CORS, tracing and rate limiting applied.
///
/// The caller still has to attach the DI service provider.
pub fn router(config: &AppConfig, limiter: RateLimiter) -> Router {
    let origin = config
        .cors_origin
        .parse::<HeaderValue>()
        .unwrap_or_else(|_| {
            warn!("invalid CORS origin {:?}, using default", config.cors_origin);
            HeaderValue::from_static(DEFAULT_CORS_ORIGIN)
        });

    Router::new()
        .route("/health", get(health))
        .nest("/auth", auth::router())
        .nest("/chat", chat::router())
        .layer(middleware::from_fn_with_state(limiter, rate_limit_middleware))
        .layer(
            CorsLayer::new()
                .allow_headers(Any)
                .allow_methods([Method::GET, Method::POST, Method::DELETE])
                .allow_origin(origin),
        )
        .layer(TraceLayer::new_for_http())
}
