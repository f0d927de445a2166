pub mod bootstrap;
pub mod config;
pub mod docx_writer;
pub mod llm_clients;
pub mod response;
pub mod security;
pub mod storage;
