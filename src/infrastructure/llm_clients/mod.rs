pub mod anthropic;
pub mod openai;

use crate::domain::error::Result;
use crate::domain::llm_config::LLMConfig;
use crate::domain::llm_config::LLMProvider;
use anthropic::AnthropicClient;
use async_trait::async_trait;
use openai::OpenAIClient;

/// One prompt in, one raw reply out. Implementations make exactly one HTTP
/// call per invocation and never retry.
#[async_trait]
pub trait LLMClient {
    async fn complete(&self, config: &LLMConfig, prompt: &str) -> Result<String>;
}

pub struct RouterClient {
    anthropic: AnthropicClient,
    openai: OpenAIClient,
}

impl RouterClient {
    pub fn new() -> Self {
        Self {
            anthropic: AnthropicClient::new(),
            openai: OpenAIClient::new(),
        }
    }
}

#[async_trait]
impl LLMClient for RouterClient {
    async fn complete(&self, config: &LLMConfig, prompt: &str) -> Result<String> {
        match config.provider {
            LLMProvider::Anthropic => self.anthropic.complete(config, prompt).await,
            LLMProvider::OpenAI | LLMProvider::Local => self.openai.complete(config, prompt).await,
        }
    }
}

pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    if base_url.ends_with('/') {
        format!("{}{}", base_url, path)
    } else {
        format!("{}/{}", base_url, path)
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use crate::domain::error::AppError;
    use std::sync::Mutex;

    /// Replays canned replies in order and records every prompt it receives.
    pub struct FakeLLMClient {
        replies: Mutex<Vec<Result<String>>>,
        pub prompts: Mutex<Vec<String>>,
        pub max_tokens_seen: Mutex<Vec<Option<u32>>>,
    }

    impl FakeLLMClient {
        pub fn replying(reply: &str) -> Self {
            Self::with_replies(vec![Ok(reply.to_string())])
        }

        pub fn failing(message: &str) -> Self {
            Self::with_replies(vec![Err(AppError::LLMError(message.to_string()))])
        }

        pub fn with_replies(replies: Vec<Result<String>>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().rev().collect()),
                prompts: Mutex::new(Vec::new()),
                max_tokens_seen: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LLMClient for FakeLLMClient {
        async fn complete(&self, config: &LLMConfig, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.max_tokens_seen.lock().unwrap().push(config.max_tokens);
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(AppError::LLMError("no canned reply left".to_string())))
        }
    }
}
