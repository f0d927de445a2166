//! URS text extraction.
//!
//! Maps uploaded bytes to plain text by declared extension:
//! - PDF: layout-aware extraction, then page-by-page extraction
//! - DOCX: body paragraphs, then table cells
//! - TXT: UTF-8, then Latin-1

pub(crate) mod parsers;

use crate::domain::error::{AppError, Result};
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrsFormat {
    Pdf,
    Docx,
    Txt,
}

impl UrsFormat {
    /// Accepts `pdf`, `.PDF` and so on.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.trim().trim_start_matches('.').to_lowercase().as_str() {
            "pdf" => Some(UrsFormat::Pdf),
            "docx" => Some(UrsFormat::Docx),
            "txt" => Some(UrsFormat::Txt),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            UrsFormat::Pdf => "pdf",
            UrsFormat::Docx => "docx",
            UrsFormat::Txt => "txt",
        }
    }
}

/// Lowercased extension of an uploaded file name, if any.
pub fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

pub fn extract(bytes: &[u8], declared_extension: &str) -> Result<String> {
    let Some(format) = UrsFormat::from_extension(declared_extension) else {
        warn!(extension = %declared_extension, "Rejected unsupported URS file type");
        return Err(AppError::ExtractionError("unsupported file type".to_string()));
    };

    debug!(format = ?format, bytes = bytes.len(), "Extracting URS text");
    let text = match format {
        UrsFormat::Pdf => parsers::pdf::extract_pdf(bytes)?,
        UrsFormat::Docx => parsers::docx::extract_docx(bytes)?,
        UrsFormat::Txt => parsers::txt::extract_txt(bytes)?,
    };

    if text.trim().is_empty() {
        return Err(AppError::ExtractionError(format!(
            "no text found in {} document",
            format.extension().to_uppercase()
        )));
    }

    info!(format = ?format, chars = text.chars().count(), "Extracted URS text");
    Ok(text)
}
