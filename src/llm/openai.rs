// OpenAI-compatible chat completions adapter (streaming)
// API Reference: https://platform.openai.com/docs/api-reference/chat/streaming

use std::collections::VecDeque;
use std::time::Duration;

use async_openai::config::OpenAIConfig;
use async_openai::error::{OpenAIError, StreamError};
use async_openai::types::chat::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
    CreateChatCompletionStreamResponse,
};
use async_openai::Client;
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::StatusCode;
use reqwest_eventsource::Error as EventSourceError;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::LLMConfig;
use crate::llm::provider::{ChunkStream, CompletionClient};
use crate::types::{AppError, AppResult, CompletionChunk, CompletionRequest, Credential};

pub struct OpenAIAdapter {
    http: reqwest::Client,
    api_base: String,
    idle_timeout: Duration,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ApiErrorBody,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
}

/// One streamed delta, reduced to what the answer needs.
#[derive(Debug, Default)]
struct Delta {
    content: Option<String>,
    /// The service set `finish_reason`; nothing further belongs to the answer.
    finished: bool,
}

impl OpenAIAdapter {
    pub fn new(config: &LLMConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| AppError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            idle_timeout: config.stream_idle_timeout(),
        })
    }

    // The key arrives with every request, so the client is per call.
    fn client_for(&self, credential: &Credential) -> Client<OpenAIConfig> {
        let config = OpenAIConfig::new()
            .with_api_base(&self.api_base)
            .with_api_key(credential.expose());
        Client::with_config(config).with_http_client(self.http.clone())
    }
}

fn to_openai_request(request: &CompletionRequest) -> AppResult<CreateChatCompletionRequest> {
    let messages = request
        .messages
        .iter()
        .map(|m| match m.role.as_str() {
            "user" => ChatCompletionRequestUserMessageArgs::default()
                .content(m.content.clone())
                .build()
                .map(ChatCompletionRequestMessage::from)
                .map_err(|e| AppError::InvalidRequest(e.to_string())),
            other => Err(AppError::InvalidRequest(format!("unsupported message role: {}", other))),
        })
        .collect::<AppResult<Vec<_>>>()?;

    CreateChatCompletionRequestArgs::default()
        .model(&request.model)
        .messages(messages)
        .stream(true)
        .build()
        .map_err(|e| AppError::InvalidRequest(e.to_string()))
}

#[async_trait]
impl CompletionClient for OpenAIAdapter {
    async fn stream_answer(
        &self,
        request: &CompletionRequest,
        credential: &Credential,
    ) -> AppResult<ChunkStream> {
        info!(model = %request.model, "Requesting streamed completion");

        let openai_request = to_openai_request(request)?;
        let responses = self
            .client_for(credential)
            .chat()
            .create_stream(openai_request)
            .await;
        let responses = match responses {
            Ok(responses) => responses,
            Err(e) => return Err(map_error(e).await),
        };

        let deltas = responses
            .then(|item| async move {
                match item {
                    Ok(response) => Ok(decode_response(response)),
                    Err(e) => Err(map_error(e).await),
                }
            })
            .boxed();

        // A rejected request surfaces on the first pull; report it as a call
        // failure rather than as a broken answer.
        let mut chunks = chunk_stream(deltas, self.idle_timeout);
        match chunks.next().await {
            Some(Err(e)) => Err(e),
            Some(Ok(first)) => Ok(stream::once(async move { Ok(first) }).chain(chunks).boxed()),
            None => Ok(stream::empty().boxed()),
        }
    }
}

fn decode_response(response: CreateChatCompletionStreamResponse) -> Delta {
    match response.choices.into_iter().next() {
        Some(choice) => Delta {
            content: choice.delta.content.filter(|content| !content.is_empty()),
            finished: choice.finish_reason.is_some(),
        },
        None => Delta::default(),
    }
}

async fn map_error(err: OpenAIError) -> AppError {
    match err {
        OpenAIError::ApiError(api) => AppError::Service(api.message),
        OpenAIError::Reqwest(e) => AppError::Network(format!("request failed: {}", e)),
        OpenAIError::StreamError(inner) => {
            let inner: Box<StreamError> = inner.into();
            map_stream_error(*inner).await
        }
        other => AppError::Service(other.to_string()),
    }
}

async fn map_stream_error(err: StreamError) -> AppError {
    match err {
        StreamError::ReqwestEventSource(EventSourceError::InvalidStatusCode(status, response)) => {
            let body = response.text().await.unwrap_or_default();
            status_error(status, &body)
        }
        StreamError::ReqwestEventSource(EventSourceError::Transport(e)) => {
            AppError::Network(format!("stream interrupted: {}", e))
        }
        StreamError::ReqwestEventSource(EventSourceError::StreamEnded) => {
            AppError::Network("stream closed before the completion signal".to_string())
        }
        other => AppError::Service(format!("stream failed: {}", other)),
    }
}

fn status_error(status: StatusCode, body: &str) -> AppError {
    let message = match serde_json::from_str::<ErrorResponse>(body) {
        Ok(parsed) => format!(
            "{} ({}, type: {})",
            parsed.error.message,
            status,
            parsed.error.error_type.as_deref().unwrap_or("unknown")
        ),
        Err(_) if body.is_empty() => status.to_string(),
        Err(_) => format!("{} ({})", body, status),
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::Auth(message),
        _ => AppError::Service(message),
    }
}

struct StreamState {
    deltas: BoxStream<'static, AppResult<Delta>>,
    pending: VecDeque<AppResult<CompletionChunk>>,
    idle_timeout: Duration,
    chunks: usize,
    finished: bool,
}

/// Turn decoded deltas into answer chunks. The sequence ends after the
/// finishing delta or after the first error.
fn chunk_stream(deltas: BoxStream<'static, AppResult<Delta>>, idle_timeout: Duration) -> ChunkStream {
    let state = StreamState {
        deltas,
        pending: VecDeque::new(),
        idle_timeout,
        chunks: 0,
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }

            match tokio::time::timeout(state.idle_timeout, state.deltas.next()).await {
                Err(_) => {
                    state.finished = true;
                    state.pending.push_back(Err(AppError::Network(format!(
                        "no data received for {:?}",
                        state.idle_timeout
                    ))));
                }
                Ok(Some(Err(e))) => {
                    warn!(error = %e, "Completion stream reported an error");
                    state.finished = true;
                    state.pending.push_back(Err(e));
                }
                Ok(Some(Ok(delta))) => {
                    if let Some(content) = delta.content {
                        state.chunks += 1;
                        state.pending.push_back(Ok(CompletionChunk::new(content)));
                    }
                    if delta.finished {
                        debug!(chunks = state.chunks, "Completion stream finished");
                        state.finished = true;
                    }
                }
                Ok(None) => {
                    state.finished = true;
                    state.pending.push_back(Err(AppError::Network(
                        "stream closed before the completion signal".to_string(),
                    )));
                }
            }
        }
    })
    .boxed()
}
