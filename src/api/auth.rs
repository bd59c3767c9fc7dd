//! Account endpoints

use crate::api::{BearerToken, JsonBody};
use crate::api::auth::schemas::{AuthResponse, LoginRequest, SignupRequest, UserEnvelope};
use crate::api::chat::schemas::StatusMessage;
use crate::core::error::ServiceError;
use crate::core::traits::AuthService;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use di_axum::Inject;

pub fn router() -> Router {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/me", get(me))
        .route("/logout", post(logout))
}

async fn signup(
    Inject(auth_service): Inject<dyn AuthService>,
    JsonBody(request): JsonBody<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ServiceError> {
    let session = auth_service
        .signup(&request.name, &request.email, &request.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User created successfully".to_owned(),
            token: session.token,
            user: session.user,
        }),
    ))
}

async fn login(
    Inject(auth_service): Inject<dyn AuthService>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<Json<AuthResponse>, ServiceError> {
    let session = auth_service.login(&request.email, &request.password).await?;

    Ok(Json(AuthResponse {
        message: "Login successful".to_owned(),
        token: session.token,
        user: session.user,
    }))
}

async fn me(
    Inject(auth_service): Inject<dyn AuthService>,
    BearerToken(token): BearerToken,
) -> Result<Json<UserEnvelope>, ServiceError> {
    let user = auth_service.authenticate(&token).await?;
    Ok(Json(UserEnvelope { user }))
}

async fn logout(
    Inject(auth_service): Inject<dyn AuthService>,
    BearerToken(token): BearerToken,
) -> Result<Json<StatusMessage>, ServiceError> {
    auth_service.logout(&token).await?;

    Ok(Json(StatusMessage {
        message: "Logged out successfully".to_owned(),
    }))
}

pub mod schemas {
    use crate::core::account::User;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, Debug, Default)]
    pub struct SignupRequest {
        #[serde(default)]
        pub name: String,
        #[serde(default)]
        pub email: String,
        #[serde(default)]
        pub password: String,
    }

    #[derive(Serialize, Deserialize, Debug, Default)]
    pub struct LoginRequest {
        #[serde(default)]
        pub email: String,
        #[serde(default)]
        pub password: String,
    }

    #[derive(Serialize, Deserialize, Debug)]
    pub struct AuthResponse {
        #[serde(default)]
        pub message: String,
        pub token: String,
        pub user: User,
    }

    #[derive(Serialize, Deserialize, Debug)]
    pub struct UserEnvelope {
        pub user: User,
    }
}
