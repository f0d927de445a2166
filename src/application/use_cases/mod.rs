pub mod audit_package;
pub mod change_analyzer;
pub mod llm_reply;
pub mod quality_checker;
pub mod rtm_generator;
pub mod template_populator;
pub mod test_generation;
pub mod text_extraction;
pub mod upload_sessions;
pub mod validation_docs;
