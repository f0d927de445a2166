use crate::application::{
    ChangeAnalyzerUseCase, QualityCheckUseCase, TestGenerationUseCase, UploadSessionStore,
};
use crate::domain::llm_config::LLMConfig;
use crate::infrastructure::config::{AppConfig, ConfigService};

pub struct AppState {
    pub config: AppConfig,
    pub config_service: ConfigService,
    pub test_generation_use_case: TestGenerationUseCase,
    pub quality_check_use_case: QualityCheckUseCase,
    pub change_analyzer_use_case: ChangeAnalyzerUseCase,
    pub upload_sessions: UploadSessionStore,
}

impl AppState {
    /// Request override if given, else the configured model, with the API key
    /// filled in from the environment or keyring.
    pub fn llm_config(&self, requested: Option<&LLMConfig>) -> LLMConfig {
        self.config_service
            .resolve_llm_config(requested.unwrap_or(&self.config.llm))
    }
}
