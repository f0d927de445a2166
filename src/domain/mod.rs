pub mod baseline;
pub mod error;
pub mod llm_config;
pub mod quality;
pub mod test_step;
