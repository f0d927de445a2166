use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::{LLMConfig, LLMProvider};
use crate::infrastructure::security::keyring::KeyringManager;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, warn};

const DEFAULT_CONFIG_FILE: &str = "urs_testgen.toml";
const KEYRING_SERVICE: &str = "urs-testgen";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub baselines_dir: PathBuf,
    /// Markdown file with the generation instructions. The embedded default
    /// is used when unset or unreadable.
    pub master_prompt_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    pub max_upload_bytes: usize,
    pub upload_session_ttl_secs: u64,
    /// Open sessions held in memory at once.
    pub max_upload_sessions: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub llm: LLMConfig,
    pub storage: StorageConfig,
    pub limits: LimitsConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3001,
            },
            llm: LLMConfig::default(),
            storage: StorageConfig {
                baselines_dir: PathBuf::from("baselines"),
                master_prompt_path: Some(PathBuf::from("master_prompt.md")),
            },
            limits: LimitsConfig {
                max_upload_bytes: 16 * 1024 * 1024,
                upload_session_ttl_secs: 30 * 60,
                max_upload_sessions: 32,
            },
        }
    }
}

impl AppConfig {
    /// Defaults, then `urs_testgen.toml` (or `$URS_CONFIG`), then `URS_*`
    /// environment variables with `__` as the nesting separator.
    pub fn load() -> Result<Self> {
        let path = std::env::var("URS_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        debug!(config_file = %path, "Loading configuration");
        Self::from_figment(
            Figment::from(Serialized::defaults(AppConfig::default()))
                .merge(Toml::file(path))
                .merge(Env::prefixed("URS_").split("__")),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        figment
            .extract()
            .map_err(|e| AppError::ValidationError(format!("Invalid configuration: {}", e)))
    }
}

pub struct ConfigService {
    keyring: KeyringManager,
}

impl ConfigService {
    pub fn new() -> Self {
        Self {
            keyring: KeyringManager::new(KEYRING_SERVICE),
        }
    }

    pub fn save_api_key(&self, provider: LLMProvider, key: &str) -> Result<()> {
        self.keyring.set_secret(provider.keyring_account(), key)
    }

    pub fn delete_api_key(&self, provider: LLMProvider) -> Result<()> {
        self.keyring.delete_secret(provider.keyring_account())
    }

    /// Fills in the API key from the provider's environment variable or the OS
    /// keyring when the config does not carry one.
    pub fn resolve_llm_config(&self, config: &LLMConfig) -> LLMConfig {
        let mut resolved = config.clone();
        if resolved.api_key.as_deref().map_or(false, |k| !k.trim().is_empty()) {
            return resolved;
        }

        if let Some(var) = config.provider.api_key_env() {
            if let Ok(key) = std::env::var(var) {
                if !key.trim().is_empty() {
                    resolved.api_key = Some(key);
                    return resolved;
                }
            }
        }

        match self.keyring.get_secret(config.provider.keyring_account()) {
            Ok(key) => resolved.api_key = Some(key),
            Err(err) => {
                if config.provider != LLMProvider::Local {
                    warn!(provider = ?config.provider, error = %err, "No API key available");
                }
                resolved.api_key = None;
            }
        }
        resolved
    }
}
