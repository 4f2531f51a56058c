use thiserror::Error;

use crate::api::ApiError;

/// Failure taxonomy for session operations.
///
/// Variants are distinguishable so the UI can tell "wrong password"
/// (`Rejected`) apart from "check your connection" (`Timeout`/`Network`).
#[derive(Error, Debug)]
pub enum AuthError {
    /// Client-side form validation failed; nothing was sent to the backend.
    #[error("{0}")]
    Validation(String),

    /// The backend rejected the request; the message is surfaced verbatim.
    #[error("{message}")]
    Rejected {
        message: String,
        details: Vec<String>,
    },

    #[error("Connection timeout - please check your network")]
    Timeout,

    #[error("Network unreachable: {0}")]
    Network(String),

    /// No stored refresh token to exchange.
    #[error("No session to refresh")]
    NoSession,

    #[error("Session storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl From<ApiError> for AuthError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Timeout => AuthError::Timeout,
            ApiError::Network(e) => AuthError::Network(e.to_string()),
            ApiError::Rejected { message, details } => AuthError::Rejected { message, details },
            ApiError::Unauthorized(message) => AuthError::Rejected {
                message,
                details: Vec::new(),
            },
            other => AuthError::Rejected {
                message: other.to_string(),
                details: Vec::new(),
            },
        }
    }
}
