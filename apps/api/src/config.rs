use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::llm_client::{DEFAULT_BASE_URL, DEFAULT_MODEL};

/// Placeholder shipped in `.env.example`; treated the same as an unset key.
const PLACEHOLDER_API_KEY: &str = "your_groq_api_key_here";

/// Application configuration loaded from environment variables.
///
/// Only the S3 credentials are mandatory, and only once `S3_BUCKET` is set.
/// A missing database or AI key selects the in-process store or the
/// heuristic-only analysis mode respectively.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub database_url: Option<String>,
    pub storage: StorageConfig,
    pub ai: AiConfig,
    /// Extracted text shorter than this (after trimming) fails the pipeline.
    pub min_text_length: usize,
    /// Upload cap in bytes.
    pub max_file_size: usize,
}

#[derive(Debug, Clone)]
pub enum StorageConfig {
    S3 {
        bucket: String,
        endpoint: String,
        region: String,
        access_key_id: String,
        secret_access_key: String,
    },
    Local {
        root: PathBuf,
    },
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            rust_log: "info".to_string(),
            database_url: None,
            storage: StorageConfig::Local {
                root: PathBuf::from("./uploads"),
            },
            ai: AiConfig {
                api_key: None,
                base_url: DEFAULT_BASE_URL.to_string(),
                model: DEFAULT_MODEL.to_string(),
                timeout: Duration::from_secs(30),
            },
            min_text_length: 50,
            max_file_size: 5 * 1024 * 1024,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Config::default();

        let storage = match optional_env("S3_BUCKET") {
            Some(bucket) => StorageConfig::S3 {
                bucket,
                endpoint: require_env("S3_ENDPOINT")?,
                region: optional_env("S3_REGION").unwrap_or_else(|| "us-east-1".to_string()),
                access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
                secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            },
            None => StorageConfig::Local {
                root: optional_env("UPLOAD_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("./uploads")),
            },
        };

        let ai = AiConfig {
            api_key: optional_env("GROQ_API_KEY").filter(|key| key != PLACEHOLDER_API_KEY),
            base_url: optional_env("AI_BASE_URL").unwrap_or(defaults.ai.base_url),
            model: optional_env("AI_MODEL").unwrap_or(defaults.ai.model),
            timeout: Duration::from_secs(parse_env("AI_TIMEOUT_SECS", 30u64)?),
        };

        Ok(Config {
            port: parse_env("PORT", defaults.port)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or(defaults.rust_log),
            database_url: optional_env("DATABASE_URL"),
            storage,
            ai,
            min_text_length: parse_env("MIN_TEXT_LENGTH", defaults.min_text_length)?,
            max_file_size: parse_env("MAX_FILE_SIZE", defaults.max_file_size)?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Returns the variable's value, treating empty strings as unset.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.min_text_length, 50);
        assert_eq!(config.max_file_size, 5 * 1024 * 1024);
        assert_eq!(config.ai.timeout, Duration::from_secs(30));
        assert!(config.ai.api_key.is_none());
        assert!(matches!(config.storage, StorageConfig::Local { .. }));
    }

    #[test]
    fn test_parse_env_falls_back_to_default() {
        let value: usize = parse_env("RESUME_API_TEST_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }
}
