use serde::Deserialize;
use thiserror::Error;

/// Failure taxonomy for backend requests. A client-side deadline expiry
/// (`Timeout`) is distinguishable from a server rejection so callers can say
/// "check your connection" instead of "wrong password".
#[derive(Error, Debug)]
pub enum ApiError {
    /// The backend rejected the request with a JSON error body.
    /// `message` is the backend's `error` field, surfaced verbatim.
    #[error("{message}")]
    Rejected {
        message: String,
        details: Vec<String>,
    },

    #[error("{0}")]
    Unauthorized(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    /// The request exceeded its deadline and was cancelled client-side.
    #[error("Connection timeout")]
    Timeout,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Error body shape shared by all backend endpoints.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    #[serde(default)]
    details: Option<serde_json::Value>,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            format!(
                "{}... (truncated, {} total bytes)",
                &body[..MAX_ERROR_BODY_LENGTH],
                body.len()
            )
        }
    }

    /// Extract the backend's error message and validation details, falling
    /// back to the (truncated) raw body when it is not the expected shape.
    fn parse_body(body: &str) -> (String, Vec<String>) {
        let parsed: ErrorBody = match serde_json::from_str(body) {
            Ok(parsed) => parsed,
            Err(_) => return (Self::truncate_body(body), Vec::new()),
        };

        let message = parsed.error.unwrap_or_else(|| Self::truncate_body(body));
        let details = match parsed.details {
            Some(serde_json::Value::Array(items)) => items
                .into_iter()
                .map(|item| match item {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                })
                .collect(),
            Some(serde_json::Value::String(s)) => vec![s],
            _ => Vec::new(),
        };
        (message, details)
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let (mut message, details) = Self::parse_body(body);
        if message.is_empty() {
            message = status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string();
        }
        match status.as_u16() {
            401 => ApiError::Unauthorized(message),
            404 => ApiError::NotFound(message),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(message),
            _ => ApiError::Rejected { message, details },
        }
    }

    /// Map a transport failure, separating deadline expiry from other errors.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Network(err)
        }
    }

    /// True for failures that mean "could not reach the server" rather than
    /// "the server said no".
    pub fn is_connectivity(&self) -> bool {
        matches!(self, ApiError::Timeout | ApiError::Network(_))
    }
}
