use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Rejected locally or with 400 by the server.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
}
