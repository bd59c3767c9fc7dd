//! Errors returned by the services.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed or empty input. Reported to the caller, never logged as a fault.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    /// The resource does not exist or is not owned by the caller.
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("persistence error: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("password hashing error: {0}")]
    PasswordHash(argon2::password_hash::Error),
}

impl ServiceError {
    pub fn chat_not_found() -> Self {
        ServiceError::NotFound("Chat not found".to_owned())
    }
}
