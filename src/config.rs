use serde::Deserialize;
use std::env;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the tenantdesk server.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Base URL of the object-store gateway holding tenant documents.
    pub store_url: String,
    /// Bucket containing the `listings/{address}/{tenant}/{filename}` tree.
    pub store_bucket: String,
    /// Optional API key required to access the object store.
    pub store_api_key: Option<String>,
    /// Shared secret used to sign time-limited download URLs.
    pub store_signing_key: String,
    /// Lifetime of presigned download URLs, in seconds.
    pub presign_expiry_secs: u64,
    /// Base URL of the chat-completion gateway.
    pub llm_url: String,
    /// Bearer token presented to the chat-completion gateway.
    pub llm_api_key: String,
    /// Model identifier used for summarization, evaluation, and chat.
    pub llm_model: String,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

/// Default chat-completion endpoint when `LLM_URL` is not set.
pub const DEFAULT_LLM_URL: &str = "https://api.openai.com/v1";

/// Default lifetime for presigned download URLs.
pub const DEFAULT_PRESIGN_EXPIRY_SECS: u64 = 3600;

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            store_url: load_env("STORE_URL")?,
            store_bucket: load_env("STORE_BUCKET")?,
            store_api_key: load_env_optional("STORE_API_KEY"),
            store_signing_key: load_env("STORE_SIGNING_KEY")?,
            presign_expiry_secs: load_env_optional("PRESIGN_EXPIRY_SECS")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("PRESIGN_EXPIRY_SECS".into()))
                })
                .transpose()?
                .unwrap_or(DEFAULT_PRESIGN_EXPIRY_SECS),
            llm_url: load_env_optional("LLM_URL").unwrap_or_else(|| DEFAULT_LLM_URL.to_string()),
            llm_api_key: load_env("LLM_API_KEY")?,
            llm_model: load_env("LLM_MODEL")?,
            server_port: load_env_optional("SERVER_PORT")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?,
        })
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        store_url = %config.store_url,
        bucket = %config.store_bucket,
        llm_url = %config.llm_url,
        model = %config.llm_model,
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
