use std::sync::Arc;

use bytes::Bytes;

use crate::config::Config;
use crate::llm::CompletionClient;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub client: Arc<dyn CompletionClient>,
}

/// A file as received from the upload form. Request-scoped.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    /// Original filename, informational only
    pub filename: String,
    pub content_type: String,
    pub content: Bytes,
}

impl UploadedDocument {
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub model: String,
}

/// Payload of an `event: chunk` message on the answer stream.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ChunkEvent {
    pub content: String,
}

/// Payload of an `event: error` message and of JSON error responses.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ErrorEvent {
    pub error: String,
    pub kind: String,
}
