//! Parsing of free-text model replies into typed values.
//!
//! A reply is untrusted: after fence stripping it must be a JSON object, and
//! every key the caller needs is checked for presence and type. Invalid JSON
//! is a `ParseError`; valid JSON with an absent or mistyped key is a
//! `MissingField`. Both carry the raw reply.

use crate::domain::error::{AppError, Result};
use crate::domain::test_step::{ensure_unique_requirement_ids, TestStep};
use crate::infrastructure::docx_writer::truncate_chars;
use crate::infrastructure::response::prepare_json_reply;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::warn;
use validator::Validate;

const REPLY_PREVIEW_CHARS: usize = 500;

pub(crate) fn parse_reply_object(raw_reply: &str) -> Result<Map<String, Value>> {
    let payload = prepare_json_reply(raw_reply);
    let value: Value = serde_json::from_str(&payload).map_err(|err| {
        warn!(
            error = %err,
            reply_preview = %truncate_chars(raw_reply, REPLY_PREVIEW_CHARS),
            "Model reply is not valid JSON"
        );
        AppError::ParseError {
            message: format!("Failed to parse model reply as JSON: {}", err),
            raw_reply: raw_reply.to_string(),
        }
    })?;

    match value {
        Value::Object(object) => Ok(object),
        other => {
            warn!(
                kind = json_kind(&other),
                reply_preview = %truncate_chars(raw_reply, REPLY_PREVIEW_CHARS),
                "Model reply is JSON but not an object"
            );
            Err(AppError::ParseError {
                message: format!("Expected a JSON object, got {}", json_kind(&other)),
                raw_reply: raw_reply.to_string(),
            })
        }
    }
}

pub(crate) fn required_field<T: DeserializeOwned>(
    object: &Map<String, Value>,
    key: &str,
    raw_reply: &str,
) -> Result<T> {
    let value = object
        .get(key)
        .ok_or_else(|| missing_field(key, raw_reply, "absent"))?;
    serde_json::from_value(value.clone())
        .map_err(|err| missing_field(key, raw_reply, &err.to_string()))
}

/// Absent or `null` yields `T::default()`; present but mistyped is an error.
pub(crate) fn optional_field<T: DeserializeOwned + Default>(
    object: &Map<String, Value>,
    key: &str,
    raw_reply: &str,
) -> Result<T> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|err| missing_field(key, raw_reply, &err.to_string())),
    }
}

fn missing_field(field: &str, raw_reply: &str, reason: &str) -> AppError {
    warn!(
        field = %field,
        reason = %reason,
        reply_preview = %truncate_chars(raw_reply, REPLY_PREVIEW_CHARS),
        "Model reply is missing an expected field"
    );
    AppError::MissingField {
        field: field.to_string(),
        raw_reply: raw_reply.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Extracts and validates the `test_steps` array of a generation reply.
pub fn parse_test_steps(raw_reply: &str) -> Result<Vec<TestStep>> {
    let object = parse_reply_object(raw_reply)?;
    let items: Vec<Value> = required_field(&object, "test_steps", raw_reply)?;

    let mut steps = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let step: TestStep = serde_json::from_value(item).map_err(|err| {
            missing_field(&format!("test_steps[{}]", index), raw_reply, &err.to_string())
        })?;

        if let Err(errors) = step.validate() {
            let mut fields: Vec<String> = errors
                .field_errors()
                .keys()
                .map(|name| name.to_string())
                .collect();
            fields.sort();
            return Err(missing_field(
                &format!("test_steps[{}].{}", index, fields.join(",")),
                raw_reply,
                &errors.to_string(),
            ));
        }
        steps.push(step);
    }

    if steps.is_empty() {
        warn!("Model reply contained an empty test_steps array");
    }
    ensure_unique_requirement_ids(&steps)?;
    Ok(steps)
}
