use crate::domain::error::{AppError, Result};
use lopdf::Document;
use std::panic::{self, UnwindSafe};
use tracing::{debug, warn};

/// Layout-aware extraction first. If it fails, panics or yields only
/// whitespace, fall back to lopdf page by page.
pub fn extract_pdf(bytes: &[u8]) -> Result<String> {
    extract_pdf_with(bytes, |owned| {
        pdf_extract::extract_text_from_mem(&owned).map_err(|e| e.to_string())
    })
}

fn extract_pdf_with<F>(bytes: &[u8], layout: F) -> Result<String>
where
    F: FnOnce(Vec<u8>) -> std::result::Result<String, String> + UnwindSafe,
{
    if let Some(text) = extract_with_layout(bytes, layout) {
        return Ok(text);
    }

    let text = extract_page_by_page(bytes)?;
    if text.trim().is_empty() {
        return Err(AppError::ExtractionError(
            "empty or image-only PDF".to_string(),
        ));
    }
    Ok(text)
}

fn extract_with_layout<F>(bytes: &[u8], layout: F) -> Option<String>
where
    F: FnOnce(Vec<u8>) -> std::result::Result<String, String> + UnwindSafe,
{
    let owned = bytes.to_vec();
    // pdf-extract panics on some malformed inputs instead of returning an error.
    match panic::catch_unwind(move || layout(owned)) {
        Ok(Ok(text)) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Ok(Ok(_)) => {
            debug!("Layout-aware PDF extraction returned no text");
            None
        }
        Ok(Err(err)) => {
            warn!(error = %err, "Layout-aware PDF extraction failed, falling back");
            None
        }
        Err(_) => {
            warn!("Layout-aware PDF extraction panicked, falling back");
            None
        }
    }
}

fn extract_page_by_page(bytes: &[u8]) -> Result<String> {
    let document = Document::load_mem(bytes)
        .map_err(|e| AppError::ExtractionError(format!("Failed to load PDF: {}", e)))?;

    let mut pages = Vec::new();
    for page_number in document.get_pages().keys() {
        match document.extract_text(&[*page_number]) {
            Ok(page_text) => {
                let trimmed = page_text.trim();
                if !trimmed.is_empty() {
                    pages.push(trimmed.to_string());
                }
            }
            Err(err) => debug!(page = page_number, error = %err, "No text on PDF page"),
        }
    }
    Ok(pages.join("\n"))
}
