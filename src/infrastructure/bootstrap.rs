use std::sync::{Arc, Mutex};

use tracing::info;

use crate::application::{
    ChangeAnalyzerUseCase, QualityCheckUseCase, TestGenerationUseCase, UploadSessionStore,
};
use crate::infrastructure::config::{AppConfig, ConfigService};
use crate::infrastructure::llm_clients::{LLMClient, RouterClient};
use crate::infrastructure::storage::BaselineStore;
use crate::interfaces::http::{add_log, LogEntry};
use crate::interfaces::state::AppState;

pub fn setup(config: AppConfig, logs: &Arc<Mutex<Vec<LogEntry>>>) -> Arc<AppState> {
    let llm_client: Arc<dyn LLMClient + Send + Sync> = Arc::new(RouterClient::new());
    let baseline_store = Arc::new(BaselineStore::new(config.storage.baselines_dir.clone()));

    let test_generation_use_case =
        TestGenerationUseCase::new(llm_client.clone(), config.storage.master_prompt_path.as_deref());
    let quality_check_use_case = QualityCheckUseCase::new(llm_client);
    let change_analyzer_use_case = ChangeAnalyzerUseCase::new(baseline_store.clone());
    let upload_sessions = UploadSessionStore::new(
        config.limits.upload_session_ttl_secs,
        config.limits.max_upload_sessions,
    );

    info!(
        provider = ?config.llm.provider,
        model = %config.llm.model,
        baselines_dir = %baseline_store.dir().display(),
        "Application state ready"
    );
    add_log(
        logs,
        "INFO",
        "System",
        &format!(
            "Using {:?} model {} (baselines in {})",
            config.llm.provider,
            config.llm.model,
            baseline_store.dir().display()
        ),
    );

    Arc::new(AppState {
        config,
        config_service: ConfigService::new(),
        test_generation_use_case,
        quality_check_use_case,
        change_analyzer_use_case,
        upload_sessions,
    })
}
