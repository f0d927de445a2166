pub mod use_cases;

pub use use_cases::change_analyzer::ChangeAnalyzerUseCase;
pub use use_cases::quality_checker::QualityCheckUseCase;
pub use use_cases::test_generation::TestGenerationUseCase;
pub use use_cases::upload_sessions::UploadSessionStore;
