// Prompt assembly for document question answering

use crate::types::{AppError, AppResult, CompletionRequest, LLMMessage};

/// Combine document text and a question into a single-message request.
///
/// The document is embedded verbatim; nothing is truncated.
pub fn build_request(document_text: &str, question: &str, model: &str) -> AppResult<CompletionRequest> {
    if document_text.is_empty() {
        return Err(AppError::EmptyInput("The document contains no text.".to_string()));
    }
    if question.is_empty() {
        return Err(AppError::EmptyInput("Please enter a question.".to_string()));
    }

    Ok(CompletionRequest {
        model: model.to_string(),
        messages: vec![LLMMessage::user(render_prompt(document_text, question))],
        stream: true,
    })
}

fn render_prompt(document_text: &str, question: &str) -> String {
    format!(
        "Based on the following document, please answer the question provided.\n\n\
         **Document:**\n{}\n\n\
         ---\n\n\
         **Question:** {}",
        document_text, question
    )
}
