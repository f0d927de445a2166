use once_cell::sync::Lazy;
use regex::Regex;

static THINK_TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<think>[\s\S]*?</think>|<think\s*/>").unwrap());

static REASONING_TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<reasoning>[\s\S]*?</reasoning>").unwrap());

/// Removes reasoning blocks some models prepend to their answer.
pub fn clean_llm_response(response: &str) -> String {
    let cleaned = THINK_TAG_PATTERN.replace_all(response, "");
    let cleaned = REASONING_TAG_PATTERN.replace_all(&cleaned, "");
    cleaned.trim().to_string()
}

/// Strips one leading ```` ```json ```` or ```` ``` ```` fence and one trailing
/// ```` ``` ```` fence. Text without a fence is returned trimmed.
pub fn strip_code_fence(value: &str) -> String {
    let trimmed = value.trim();
    let body = if let Some(stripped) = trimmed.strip_prefix("```json") {
        stripped
    } else if let Some(stripped) = trimmed.strip_prefix("```") {
        stripped
    } else {
        trimmed
    };
    let body = body.trim();
    body.strip_suffix("```").unwrap_or(body).trim().to_string()
}

/// Full reply preparation applied before JSON parsing.
pub fn prepare_json_reply(reply: &str) -> String {
    strip_code_fence(&clean_llm_response(reply))
}
