use config::{Config, ConfigError, Environment as EnvironmentSource, File};
use serde::Deserialize;

use super::Environment;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub llm: LlmSettings,
    pub cache: CacheSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    /// Shared secret for tokens issued by the external auth provider.
    pub jwt_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmSettings {
    /// "openai", "deepseek", "custom" or "mock".
    pub provider: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub base_url: Option<String>,
    pub chat_model: String,
    pub max_tokens: usize,
    pub temperature: f32,
    #[serde(default = "default_connect_attempts")]
    pub connect_attempts: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_keep_alive_seconds")]
    pub sse_keep_alive_seconds: u64,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    #[serde(default)]
    pub mock_reply: Option<String>,
    #[serde(default)]
    pub mock_fragment_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    /// Zero disables the conversation-list cache.
    #[serde(default = "default_list_ttl_seconds")]
    pub conversation_list_ttl_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default)]
    pub enable_json: bool,
}

fn default_max_connections() -> u32 {
    10
}

fn default_connect_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_keep_alive_seconds() -> u64 {
    15
}

fn default_system_prompt() -> String {
    "You are a helpful assistant.".to_string()
}

fn default_list_ttl_seconds() -> u64 {
    30
}

impl Settings {
    /// Layered load: `appsettings.{env}.toml` (optional) overridden by
    /// `APP__`-prefixed environment variables.
    pub fn load(environment: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(
                File::with_name(&format!("appsettings.{}", environment.as_str())).required(false),
            )
            .add_source(EnvironmentSource::with_prefix("APP").separator("__"))
            .build()?
            .try_deserialize()
    }
}
