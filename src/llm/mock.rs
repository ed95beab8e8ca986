// Scripted completion client for tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use crate::llm::provider::{ChunkStream, CompletionClient};
use crate::types::{AppError, AppResult, CompletionChunk, CompletionRequest, Credential};

/// What the scripted client does when called.
pub enum Script {
    /// Yield these items in order, then end.
    Items(Vec<AppResult<CompletionChunk>>),
    /// Fail before any stream is returned.
    Reject(AppError),
}

pub struct ScriptedClient {
    script: Mutex<Option<Script>>,
    calls: AtomicUsize,
    last_request: Mutex<Option<CompletionRequest>>,
}

impl ScriptedClient {
    pub fn new(script: Script) -> Self {
        Self {
            script: Mutex::new(Some(script)),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn chunks(parts: &[&str]) -> Self {
        Self::new(Script::Items(
            parts.iter().map(|p| Ok(CompletionChunk::new(*p))).collect(),
        ))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn stream_answer(
        &self,
        request: &CompletionRequest,
        _credential: &Credential,
    ) -> AppResult<ChunkStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());

        let script = self.script.lock().unwrap().take();
        match script {
            Some(Script::Items(items)) => Ok(stream::iter(items).boxed()),
            Some(Script::Reject(err)) => Err(err),
            None => Err(AppError::Service("script already consumed".to_string())),
        }
    }
}
