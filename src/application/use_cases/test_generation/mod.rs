pub mod prompts;

use crate::application::use_cases::llm_reply::parse_test_steps;
use crate::domain::error::Result;
use crate::domain::llm_config::LLMConfig;
use crate::domain::test_step::TestStep;
use crate::infrastructure::llm_clients::LLMClient;
use prompts::{build_generation_prompt, load_master_prompt};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub const GENERATION_MAX_TOKENS: u32 = 8000;

pub struct TestGenerationUseCase {
    llm_client: Arc<dyn LLMClient + Send + Sync>,
    master_prompt: String,
}

impl TestGenerationUseCase {
    pub fn new(llm_client: Arc<dyn LLMClient + Send + Sync>, master_prompt_path: Option<&Path>) -> Self {
        Self {
            llm_client,
            master_prompt: load_master_prompt(master_prompt_path),
        }
    }

    /// Makes exactly one model call. Transport failures surface as
    /// `LLMError`; reply problems as `ParseError`/`MissingField`.
    pub async fn generate_test_steps(&self, config: &LLMConfig, urs_text: &str) -> Result<Vec<TestStep>> {
        let prompt = build_generation_prompt(&self.master_prompt, urs_text);
        let config = config.with_max_tokens(GENERATION_MAX_TOKENS);

        info!(
            provider = ?config.provider,
            model = %config.model,
            urs_chars = urs_text.chars().count(),
            "Requesting test steps"
        );
        let raw_reply = self.llm_client.complete(&config, &prompt).await?;

        let steps = parse_test_steps(&raw_reply)?;
        info!(steps = steps.len(), "Generated test steps");
        Ok(steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::AppError;
    use crate::infrastructure::llm_clients::fake::FakeLLMClient;

    const URS: &str = "1. The system shall log in users.\n1.1 Passwords must be 8+ chars.";
    const REPLY: &str = r#"{"test_steps":[{"step_no":1,"requirement_id":"REQ-1","description":"Login","expected_result":"User logs in"},{"step_no":2,"requirement_id":"REQ-1.1","description":"Password length","expected_result":"Rejects short passwords"}]}"#;

    #[tokio::test]
    async fn sends_one_prompt_with_urs_and_parses_reply() {
        let client = Arc::new(FakeLLMClient::replying(REPLY));
        let use_case = TestGenerationUseCase::new(client.clone(), None);

        let steps = use_case
            .generate_test_steps(&LLMConfig::default(), URS)
            .await
            .unwrap();

        assert_eq!(steps.len(), 2);
        assert_eq!(client.calls(), 1);
        let prompt = client.prompts.lock().unwrap()[0].clone();
        assert!(prompt.contains(URS));
        assert!(prompt.ends_with("Generate the JSON output with test_steps array now:"));
        assert_eq!(
            client.max_tokens_seen.lock().unwrap()[0],
            Some(GENERATION_MAX_TOKENS)
        );
    }

    #[tokio::test]
    async fn model_failure_is_not_retried() {
        let client = Arc::new(FakeLLMClient::failing("connection reset"));
        let use_case = TestGenerationUseCase::new(client.clone(), None);

        let result = use_case.generate_test_steps(&LLMConfig::default(), URS).await;

        assert!(matches!(result, Err(AppError::LLMError(_))));
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn prose_reply_surfaces_raw_text() {
        let client = Arc::new(FakeLLMClient::replying("I cannot help with that."));
        let use_case = TestGenerationUseCase::new(client, None);

        let err = use_case
            .generate_test_steps(&LLMConfig::default(), URS)
            .await
            .unwrap_err();
        assert_eq!(err.raw_reply(), Some("I cannot help with that."));
    }

    #[tokio::test]
    async fn generated_steps_populate_template_in_reply_order() {
        use crate::application::use_cases::template_populator::populate_template;
        use crate::application::use_cases::template_populator::tests::{
            tables_text, template_bytes, STANDARD_HEADERS,
        };

        let client = Arc::new(FakeLLMClient::replying(REPLY));
        let use_case = TestGenerationUseCase::new(client, None);
        let steps = use_case
            .generate_test_steps(&LLMConfig::default(), URS)
            .await
            .unwrap();

        let template = template_bytes(&STANDARD_HEADERS, false);
        let tables = tables_text(&populate_template(&template, &steps).unwrap());

        assert_eq!(tables[0].len(), 3);
        assert_eq!(
            tables[0][1],
            vec!["1", "REQ-1", "Login", "User logs in", "", "", "", ""]
        );
        assert_eq!(
            tables[0][2],
            vec!["2", "REQ-1.1", "Password length", "Rejects short passwords", "", "", "", ""]
        );
    }
}
