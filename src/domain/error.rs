use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize)]
pub enum AppError {
    Internal(String),
    NotFound(String),
    ValidationError(String),
    ExtractionError(String),
    LLMError(String),
    /// Model reply could not be parsed as JSON. The reply is kept for diagnosis.
    ParseError { message: String, raw_reply: String },
    /// Model reply was valid JSON but an expected key was absent or mistyped.
    MissingField { field: String, raw_reply: String },
    TemplateError(String),
    SecurityError(String),
    IoError(String),
}

impl AppError {
    pub fn raw_reply(&self) -> Option<&str> {
        match self {
            AppError::ParseError { raw_reply, .. } | AppError::MissingField { raw_reply, .. } => {
                Some(raw_reply)
            }
            _ => None,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::ExtractionError(msg) => write!(f, "Extraction error: {}", msg),
            AppError::LLMError(msg) => write!(f, "LLM error: {}", msg),
            AppError::ParseError { message, .. } => write!(f, "Parse error: {}", message),
            AppError::MissingField { field, .. } => {
                write!(f, "Parse error: missing or invalid field '{}'", field)
            }
            AppError::TemplateError(msg) => write!(f, "Template error: {}", msg),
            AppError::SecurityError(msg) => write!(f, "Security error: {}", msg),
            AppError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_family_keeps_raw_reply() {
        let err = AppError::ParseError {
            message: "expected value at line 1 column 1".to_string(),
            raw_reply: "Sure! Here are your steps".to_string(),
        };
        assert_eq!(err.raw_reply(), Some("Sure! Here are your steps"));

        let err = AppError::MissingField {
            field: "test_steps".to_string(),
            raw_reply: "{}".to_string(),
        };
        assert_eq!(err.raw_reply(), Some("{}"));
        assert_eq!(
            err.to_string(),
            "Parse error: missing or invalid field 'test_steps'"
        );

        assert!(AppError::LLMError("timeout".to_string()).raw_reply().is_none());
    }
}
