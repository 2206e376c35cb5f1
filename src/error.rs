use thiserror::Error;

/// Failure of a single backend call. Never a panic: every outcome the network can produce
/// lands in one of these variants.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, refused connection, timeout, abort).
    #[error("network failure: {0}")]
    Network(String),

    /// Non-2xx response. `message` is the backend's `error`/`message` field when present.
    #[error("http {status}: {}", .message.as_deref().unwrap_or("request failed"))]
    Http {
        status: u16,
        message: Option<String>,
        body: serde_json::Value,
    },

    /// 401 on a fetch that requires a signed-in user. The session is already cleared.
    #[error("authentication required")]
    AuthRequired,

    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            ApiError::AuthRequired => Some(401),
            _ => None,
        }
    }

    /// The most specific text to put in front of a user, or `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Http {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            ApiError::AuthRequired => "Please log in to continue.".to_string(),
            _ => fallback.to_string(),
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }
}

/// Client-side form check that failed before any request went out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage backend error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored value is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("storage lock poisoned")]
    Poisoned,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Outcome of a user-initiated action. The toast has already been shown when a handler
/// returns one of these; callers use it for control flow only.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_prefers_server_text() {
        let err = ApiError::Http {
            status: 400,
            message: Some("Insufficient balance".into()),
            body: serde_json::json!({"error": "Insufficient balance"}),
        };
        assert_eq!(err.user_message("Withdrawal failed"), "Insufficient balance");
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn test_user_message_falls_back() {
        let err = ApiError::Http {
            status: 500,
            message: None,
            body: serde_json::Value::Null,
        };
        assert_eq!(err.user_message("Login failed"), "Login failed");
        assert_eq!(err.to_string(), "http 500: request failed");

        let err = ApiError::Network("connection refused".into());
        assert!(err.is_network());
        assert_eq!(err.user_message("Network error during login"), "Network error during login");
    }
}
