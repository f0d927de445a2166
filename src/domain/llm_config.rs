use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum LLMProvider {
    Anthropic,
    OpenAI,
    /// Any OpenAI-compatible endpoint, e.g. LM Studio or Ollama.
    Local,
}

impl LLMProvider {
    /// Environment variable consulted when no key is configured explicitly.
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            LLMProvider::Anthropic => Some("ANTHROPIC_API_KEY"),
            LLMProvider::OpenAI => Some("OPENAI_API_KEY"),
            LLMProvider::Local => None,
        }
    }

    pub fn from_account(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "anthropic" => Some(LLMProvider::Anthropic),
            "openai" => Some(LLMProvider::OpenAI),
            "local" => Some(LLMProvider::Local),
            _ => None,
        }
    }

    pub fn keyring_account(&self) -> &'static str {
        match self {
            LLMProvider::Anthropic => "anthropic",
            LLMProvider::OpenAI => "openai",
            LLMProvider::Local => "local",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LLMConfig {
    pub provider: LLMProvider,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub timeout_secs: u64,
}

impl LLMConfig {
    pub fn with_max_tokens(&self, max_tokens: u32) -> Self {
        Self {
            max_tokens: Some(max_tokens),
            ..self.clone()
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::Anthropic,
            base_url: "https://api.anthropic.com/v1".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
            api_key: None,
            max_tokens: Some(8000),
            temperature: None,
            timeout_secs: 120,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_accounts_round_trip() {
        for provider in [LLMProvider::Anthropic, LLMProvider::OpenAI, LLMProvider::Local] {
            assert_eq!(LLMProvider::from_account(provider.keyring_account()), Some(provider));
        }
        assert_eq!(LLMProvider::from_account("OpenAI"), Some(LLMProvider::OpenAI));
        assert_eq!(LLMProvider::from_account("gemini"), None);
    }
}
