use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LLMConfig,
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LLMConfig {
    pub api_base: String,
    pub model: String,
    pub connect_timeout_secs: u64,
    /// Longest gap allowed between two pieces of a streamed answer.
    pub stream_idle_timeout_secs: u64,
}

impl LLMConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn stream_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.stream_idle_timeout_secs)
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            connect_timeout_secs: 10,
            stream_idle_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let defaults = LLMConfig::default();

        let max_upload_mb: usize = parse_var("MAX_UPLOAD_MB", var("MAX_UPLOAD_MB", "200"))?;
        let max_upload_bytes = max_upload_mb
            .checked_mul(1024 * 1024)
            .with_context(|| format!("MAX_UPLOAD_MB is too large: {}", max_upload_mb))?;

        Ok(Self {
            server: ServerConfig {
                port: parse_var("PORT", var("PORT", "3000"))?,
                host: var("HOST", "0.0.0.0"),
                cors_allowed_origins: var("ALLOWED_ORIGINS", "*")
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            llm: LLMConfig {
                api_base: var("COMPLETION_API_BASE", &defaults.api_base)
                    .trim_end_matches('/')
                    .to_string(),
                model: var("COMPLETION_MODEL", &defaults.model),
                connect_timeout_secs: parse_var(
                    "LLM_CONNECT_TIMEOUT_SECS",
                    var("LLM_CONNECT_TIMEOUT_SECS", &defaults.connect_timeout_secs.to_string()),
                )?,
                stream_idle_timeout_secs: parse_var(
                    "LLM_STREAM_IDLE_TIMEOUT_SECS",
                    var("LLM_STREAM_IDLE_TIMEOUT_SECS", &defaults.stream_idle_timeout_secs.to_string()),
                )?,
            },
            upload: UploadConfig {
                max_upload_bytes,
            },
        })
    }
}

fn parse_var<T>(key: &str, raw: String) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("{} has an invalid value: {:?}", key, raw))
}
