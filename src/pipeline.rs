//! Document-to-answer pipeline
//!
//! Extraction, prompt assembly and the completion call composed as one
//! straight line. Every precondition is checked before the network call is
//! made, and the answer is handed to the caller one chunk at a time.

use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::config::LLMConfig;
use crate::extract;
use crate::llm::{ChunkStream, CompletionClient};
use crate::models::UploadedDocument;
use crate::prompt;
use crate::types::{AppError, AppResult, Credential};

/// Everything one question-answering interaction needs, passed explicitly.
#[derive(Debug, Default)]
pub struct SessionContext {
    pub credential: Option<Credential>,
    pub document: Option<UploadedDocument>,
    pub question: Option<String>,
}

impl SessionContext {
    pub fn new(credential: Credential, document: UploadedDocument, question: impl Into<String>) -> Self {
        Self {
            credential: Some(credential),
            document: Some(document),
            question: Some(question.into()),
        }
    }
}

/// Validate the session, extract the document and open the answer stream.
pub async fn start_answer(
    ctx: &SessionContext,
    client: &dyn CompletionClient,
    llm: &LLMConfig,
) -> AppResult<ChunkStream> {
    let credential = ctx
        .credential
        .as_ref()
        .filter(|c| !c.is_blank())
        .ok_or_else(|| {
            AppError::MissingCredential("Please enter your API key to proceed.".to_string())
        })?;

    let document = ctx
        .document
        .as_ref()
        .ok_or_else(|| AppError::EmptyInput("Please upload a document.".to_string()))?;

    let question = ctx
        .question
        .as_deref()
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| AppError::EmptyInput("Please enter a question.".to_string()))?;

    info!(
        filename = %document.filename,
        content_type = %document.content_type,
        bytes = document.content.len(),
        question_len = question.len(),
        "Answering question about document"
    );

    // lopdf and csv parsing are CPU-bound; keep them off the async workers.
    let content = document.content.clone();
    let content_type = document.content_type.clone();
    let text = tokio::task::spawn_blocking(move || extract::extract_with_mime(&content, &content_type))
        .await
        .map_err(|e| AppError::Parse(format!("extraction task failed: {}", e)))??;
    if text.trim().is_empty() {
        warn!(filename = %document.filename, "Document produced no text");
        return Err(AppError::EmptyInput(
            "No text could be extracted from the document.".to_string(),
        ));
    }
    debug!(chars = text.len(), "Document text extracted");

    let request = prompt::build_request(&text, question, &llm.model)?;
    client.stream_answer(&request, credential).await
}

/// Pull the stream to completion, calling `on_update` with the answer so far
/// after every chunk.
pub async fn render_answer<F>(mut stream: ChunkStream, mut on_update: F) -> AppResult<String>
where
    F: FnMut(&str),
{
    let mut answer = String::new();
    while let Some(item) = stream.next().await {
        let chunk = item?;
        answer.push_str(&chunk.content);
        on_update(&answer);
    }
    Ok(answer)
}

pub async fn answer_question<F>(
    ctx: &SessionContext,
    client: &dyn CompletionClient,
    llm: &LLMConfig,
    on_update: F,
) -> AppResult<String>
where
    F: FnMut(&str),
{
    let stream = start_answer(ctx, client, llm).await?;
    render_answer(stream, on_update).await
}
