// Type definitions shared across the pipeline

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LLMMessage {
    pub role: String, // "user", "assistant", "system"
    pub content: String,
}

impl LLMMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }
}

/// One stateless request to the completion service.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<LLMMessage>,
    pub stream: bool,
}

/// One fragment of a streamed answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionChunk {
    pub content: String,
}

impl CompletionChunk {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// API key supplied by the caller for the duration of one session.
///
/// `Debug` and `Display` only ever show a masked hint so the secret can't
/// leak into logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Masked version of the key (last 4 chars only)
    pub fn hint(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() > 4 {
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("••••{}", tail)
        } else {
            "••••".to_string()
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Credential").field(&self.hint()).finish()
    }
}

impl std::fmt::Display for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.hint())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("Missing input: {0}")]
    EmptyInput(String),

    #[error("Missing API key: {0}")]
    MissingCredential(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Completion service error: {0}")]
    Service(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl AppError {
    /// Stable identifier used by the browser client.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Decode(_) => "decode",
            AppError::Parse(_) => "parse",
            AppError::UnsupportedType(_) => "unsupported_type",
            AppError::EmptyInput(_) => "empty_input",
            AppError::MissingCredential(_) | AppError::Auth(_) => "auth",
            AppError::Network(_) => "network",
            AppError::Service(_) => "service",
            AppError::InvalidRequest(_) => "invalid_request",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Decode(_)
            | AppError::Parse(_)
            | AppError::EmptyInput(_)
            | AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::UnsupportedType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::MissingCredential(_) | AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Network(_) | AppError::Service(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Message shown to the user in place of the answer.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Decode(_) | AppError::Parse(_) | AppError::UnsupportedType(_) => {
                format!("Error reading file: {}", self)
            }
            AppError::Auth(_) | AppError::Network(_) | AppError::Service(_) => {
                format!("An error occurred with the completion API: {}", self)
            }
            AppError::MissingCredential(msg)
            | AppError::EmptyInput(msg)
            | AppError::InvalidRequest(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.user_message(),
            "kind": self.kind(),
        });
        (self.status_code(), Json(body)).into_response()
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;
