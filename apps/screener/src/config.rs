use anyhow::{Context, Result};
use serde::Serialize;

use crate::pipeline::DEFAULT_PACING_CAP_SECS;

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub google_api_key: String,
    /// Only needed by the `db` command.
    pub database_url: Option<String>,
    pub model: ModelConfig,
    /// Upper bound for the pacing delay inserted before each worklist item.
    pub pacing_cap_secs: u64,
    pub rust_log: String,
}

/// Generation parameters handed to the model client at construction.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub safety: Vec<SafetySetting>,
}

/// One content-safety threshold, serialized as the service expects it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SafetySetting {
    pub category: String,
    pub threshold: String,
}

impl SafetySetting {
    pub fn new(category: &str, threshold: &str) -> Self {
        Self {
            category: category.to_string(),
            threshold: threshold.to_string(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.1,
            max_output_tokens: 2000,
            safety: vec![
                SafetySetting::new("HARM_CATEGORY_HARASSMENT", "BLOCK_ONLY_HIGH"),
                SafetySetting::new("HARM_CATEGORY_HATE_SPEECH", "BLOCK_ONLY_HIGH"),
            ],
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = ModelConfig::default();
        let model = ModelConfig {
            model: std::env::var("MODEL_NAME").unwrap_or(defaults.model),
            temperature: parse_env("MODEL_TEMPERATURE", defaults.temperature)?,
            max_output_tokens: parse_env("MODEL_MAX_OUTPUT_TOKENS", defaults.max_output_tokens)?,
            safety: defaults.safety,
        };

        Ok(Config {
            google_api_key: require_env("GOOGLE_API_KEY")?,
            database_url: std::env::var("DATABASE_URL").ok(),
            model,
            pacing_cap_secs: parse_env("PACING_CAP_SECS", DEFAULT_PACING_CAP_SECS)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}
