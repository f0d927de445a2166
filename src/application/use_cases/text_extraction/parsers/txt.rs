use crate::domain::error::{AppError, Result};
use encoding_rs::{UTF_8, WINDOWS_1252};
use tracing::debug;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Strict UTF-8 first; anything that is not valid UTF-8 is read as Latin-1.
pub fn extract_txt(bytes: &[u8]) -> Result<String> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    let text = match UTF_8.decode_without_bom_handling_and_without_replacement(bytes) {
        Some(text) => text.into_owned(),
        None => {
            debug!("TXT is not valid UTF-8, decoding as Latin-1");
            let (text, had_errors) = WINDOWS_1252.decode_without_bom_handling(bytes);
            if had_errors {
                return Err(AppError::ExtractionError(
                    "text file is neither UTF-8 nor Latin-1".to_string(),
                ));
            }
            text.into_owned()
        }
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AppError::ExtractionError("empty text file".to_string()));
    }
    Ok(trimmed.to_string())
}
