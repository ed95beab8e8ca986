//! Document text extraction
//!
//! Converts the raw bytes of an uploaded file into plain text that can be
//! embedded in a prompt. Supported formats are plain text, markdown, PDF and
//! CSV; everything else is rejected up front.

mod pdf;
mod table;

use crate::types::{AppError, AppResult};
use tracing::debug;

const OCTET_STREAM: &str = "application/octet-stream";

/// Closed set of formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    PlainText,
    Markdown,
    Pdf,
    Csv,
}

impl DocumentKind {
    /// Map a declared MIME type onto a supported format.
    ///
    /// Parameters such as `charset` are ignored.
    pub fn from_mime(content_type: &str) -> AppResult<Self> {
        let parsed: mime::Mime = content_type
            .trim()
            .parse()
            .map_err(|_| AppError::UnsupportedType(content_type.to_string()))?;

        match parsed.essence_str() {
            "text/plain" => Ok(DocumentKind::PlainText),
            "text/markdown" | "text/x-markdown" => Ok(DocumentKind::Markdown),
            "application/pdf" => Ok(DocumentKind::Pdf),
            "text/csv" => Ok(DocumentKind::Csv),
            other => Err(AppError::UnsupportedType(other.to_string())),
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            DocumentKind::PlainText => "text/plain",
            DocumentKind::Markdown => "text/markdown",
            DocumentKind::Pdf => "application/pdf",
            DocumentKind::Csv => "text/csv",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// Pick the content type for an upload.
///
/// The declared type wins unless it is missing or the generic
/// `application/octet-stream`, in which case the filename extension decides.
pub fn resolve_content_type(declared: Option<&str>, filename: Option<&str>) -> String {
    match declared.map(str::trim) {
        Some(ct) if !ct.is_empty() && ct != OCTET_STREAM => ct.to_string(),
        _ => filename
            .and_then(|name| mime_guess::from_path(name).first_raw())
            .unwrap_or(OCTET_STREAM)
            .to_string(),
    }
}

/// Extract plain text from `content` interpreted as `kind`.
pub fn extract(content: &[u8], kind: DocumentKind) -> AppResult<String> {
    debug!(kind = %kind, bytes = content.len(), "Extracting document text");

    match kind {
        DocumentKind::PlainText | DocumentKind::Markdown => decode_utf8(content),
        DocumentKind::Pdf => pdf::extract_pages(content),
        DocumentKind::Csv => table::render_csv(content),
    }
}

/// Resolve `content_type` and extract in one step.
pub fn extract_with_mime(content: &[u8], content_type: &str) -> AppResult<String> {
    let kind = DocumentKind::from_mime(content_type)?;
    extract(content, kind)
}

fn decode_utf8(content: &[u8]) -> AppResult<String> {
    std::str::from_utf8(content)
        .map(str::to_string)
        .map_err(|e| AppError::Decode(e.to_string()))
}
