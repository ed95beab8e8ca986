use std::convert::Infallible;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::post,
    Router,
};
use futures::stream::{self, Stream, StreamExt};
use tracing::{info, warn};
use uuid::Uuid;

use crate::extract::resolve_content_type;
use crate::models::{AppState, ChunkEvent, ErrorEvent, UploadedDocument};
use crate::pipeline::{self, SessionContext};
use crate::types::{AppError, AppResult, Credential};

pub fn router(state: AppState) -> Router {
    let body_limit = state.config.upload.max_upload_bytes;
    Router::new()
        .route("/api/ask", post(ask))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// POST /api/ask - multipart form with `api_key`, `question` and `file`
///
/// Failures detected before the completion call are plain JSON errors; once
/// the answer starts streaming, failures arrive as an `error` event.
async fn ask(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let request_id = Uuid::new_v4();
    let ctx = read_session(multipart).await?;
    info!(%request_id, "Question received");

    let chunks = pipeline::start_answer(&ctx, state.client.as_ref(), &state.config.llm)
        .await
        .inspect_err(|e| warn!(%request_id, kind = e.kind(), error = %e, "Question rejected"))?;

    let events = chunks
        .map(move |item| match item {
            Ok(chunk) => json_event("chunk", &ChunkEvent { content: chunk.content }),
            Err(e) => {
                warn!(%request_id, kind = e.kind(), error = %e, "Answer stream aborted");
                json_event("error", &error_event(&e))
            }
        })
        .chain(stream::once(async { Event::default().event("done").data("") }))
        .map(Ok::<Event, Infallible>);

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

async fn read_session(mut multipart: Multipart) -> AppResult<SessionContext> {
    let mut ctx = SessionContext::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidRequest(format!("Malformed upload: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "api_key" => {
                let key = field.text().await.map_err(malformed)?;
                ctx.credential = Some(Credential::new(key.trim()));
            }
            "question" => {
                ctx.question = Some(field.text().await.map_err(malformed)?);
            }
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = resolve_content_type(field.content_type(), Some(&filename));
                let content = field.bytes().await.map_err(malformed)?;
                // Browsers send an empty, unnamed part when no file was chosen.
                if content.is_empty() && filename.is_empty() {
                    continue;
                }
                info!(filename = %filename, content_type = %content_type, bytes = content.len(), "Received upload");
                ctx.document = Some(UploadedDocument::new(filename, content_type, content));
            }
            other => {
                warn!(field = %other, "Ignoring unknown form field");
            }
        }
    }

    Ok(ctx)
}

fn malformed(err: axum::extract::multipart::MultipartError) -> AppError {
    AppError::InvalidRequest(format!("Malformed upload: {}", err))
}

fn error_event(err: &AppError) -> ErrorEvent {
    ErrorEvent {
        error: err.user_message(),
        kind: err.kind().to_string(),
    }
}

fn json_event<T: serde::Serialize>(name: &str, payload: &T) -> Event {
    let data = serde_json::to_string(payload).unwrap_or_else(|_| "{}".to_string());
    Event::default().event(name).data(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::llm::mock::{Script, ScriptedClient};
    use crate::llm::CompletionClient;
    use crate::types::CompletionChunk;

    const BOUNDARY: &str = "docquery-test-boundary";

    fn state_with(client: Arc<dyn CompletionClient>) -> AppState {
        let config = Config::from_lookup(|_| None).unwrap();
        AppState { config, client }
    }

    fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &str, &[u8])>) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                    BOUNDARY, name, value
                )
                .as_bytes(),
            );
        }
        if let Some((filename, content_type, content)) = file {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                    BOUNDARY, filename, content_type
                )
                .as_bytes(),
            );
            body.extend_from_slice(content);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn ask_request(body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/ask")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_streams_answer_as_events() {
        let client = Arc::new(ScriptedClient::chunks(&["The ", "answer ", "is 42."]));
        let app = router(state_with(client.clone()));

        let body = multipart_body(
            &[("api_key", "sk-test-key"), ("question", "What is this about?")],
            Some(("notes.txt", "text/plain", b"Hello world.".as_slice())),
        );
        let response = app.oneshot(ask_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let text = body_text(response).await;

        let first = text.find(r#"data: {"content":"The "}"#).expect("first chunk");
        let second = text.find(r#"data: {"content":"answer "}"#).expect("second chunk");
        let third = text.find(r#"data: {"content":"is 42."}"#).expect("third chunk");
        let done = text.find("event: done").expect("done event");
        assert!(first < second && second < third && third < done);
        assert!(!text.contains("event: error"));
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_key_is_unauthorized() {
        let client = Arc::new(ScriptedClient::chunks(&["unused"]));
        let app = router(state_with(client.clone()));

        let body = multipart_body(
            &[("question", "What is this about?")],
            Some(("notes.txt", "text/plain", b"Hello world.".as_slice())),
        );
        let response = app.oneshot(ask_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["kind"], "auth");
        assert_eq!(json["error"], "Please enter your API key to proceed.");
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_upload_rejected() {
        let client = Arc::new(ScriptedClient::chunks(&["unused"]));
        let app = router(state_with(client.clone()));

        let body = multipart_body(
            &[("api_key", "sk-test-key"), ("question", "What is shown?")],
            Some(("photo.png", "image/png", [0x89u8, 0x50, 0x4e, 0x47].as_slice())),
        );
        let response = app.oneshot(ask_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert!(json["error"].as_str().unwrap().starts_with("Error reading file:"));
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_octet_stream_upload_uses_extension() {
        let client = Arc::new(ScriptedClient::chunks(&["fine"]));
        let app = router(state_with(client.clone()));

        let body = multipart_body(
            &[("api_key", "sk-test-key"), ("question", "Summarize")],
            Some(("readme.md", "application/octet-stream", b"# Heading\n\nBody".as_slice())),
        );
        let response = app.oneshot(ask_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let request = client.last_request().unwrap();
        assert!(request.messages[0].content.contains("# Heading\n\nBody"));
    }

    #[tokio::test]
    async fn test_stream_failure_becomes_error_event() {
        let client = Arc::new(ScriptedClient::new(Script::Items(vec![
            Ok(CompletionChunk::new("Partial")),
            Err(AppError::Network("stream interrupted".to_string())),
        ])));
        let app = router(state_with(client));

        let body = multipart_body(
            &[("api_key", "sk-test-key"), ("question", "q?")],
            Some(("notes.txt", "text/plain", b"doc".as_slice())),
        );
        let response = app.oneshot(ask_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let text = body_text(response).await;
        assert!(text.contains(r#"data: {"content":"Partial"}"#));
        assert!(text.contains("event: error"));
        assert!(text.contains(r#""kind":"network""#));
    }
}
