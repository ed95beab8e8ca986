use lopdf::Document;
use tracing::{debug, warn};

use crate::types::{AppError, AppResult};

/// Concatenate the text of every page in page order.
///
/// A page that fails to extract contributes an empty string; only a broken
/// container fails the whole document.
pub(super) fn extract_pages(content: &[u8]) -> AppResult<String> {
    let document = Document::load_mem(content)
        .map_err(|e| AppError::Parse(format!("invalid PDF: {}", e)))?;

    let pages = document.get_pages();
    debug!(pages = pages.len(), "Loaded PDF document");

    let mut text = String::new();
    for page_number in pages.keys() {
        match document.extract_text(&[*page_number]) {
            Ok(page_text) => text.push_str(&page_text),
            Err(e) => warn!(page = page_number, error = %e, "Skipping unreadable PDF page"),
        }
    }

    Ok(text)
}
