//! Startup configuration from environment variables

use crate::llm::DEFAULT_MODEL;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_MAX_TOKENS: u32 = 1200;
pub const DEFAULT_TEMPERATURE: f32 = 0.85;
pub const DEFAULT_LLM_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_CHUNK_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{name} has invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Generation settings
#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    /// Overrides the provider's public endpoint
    pub base_url: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChefConfig {
    pub telegram_token: String,
    pub llm: LlmConfig,
    /// Pause between pieces of a split reply
    pub chunk_delay: Duration,
    /// Fixed seed for canned-reply selection; random when unset
    pub rng_seed: Option<u64>,
    pub poll_timeout: Duration,
}

impl ChefConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let llm = LlmConfig {
            api_key: required("OPENAI_API_KEY")?,
            model: lookup("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: lookup("OPENAI_BASE_URL"),
            max_tokens: parse_or(&lookup, "CHEF_MAX_TOKENS", DEFAULT_MAX_TOKENS)?,
            temperature: parse_or(&lookup, "CHEF_TEMPERATURE", DEFAULT_TEMPERATURE)?,
            timeout: parse_opt::<u64, _>(&lookup, "CHEF_LLM_TIMEOUT_SECS")?
                .map_or(DEFAULT_LLM_TIMEOUT, Duration::from_secs),
        };

        Ok(Self {
            telegram_token: required("TELEGRAM_TOKEN")?,
            llm,
            chunk_delay: parse_opt::<u64, _>(&lookup, "CHEF_CHUNK_DELAY_MS")?
                .map_or(DEFAULT_CHUNK_DELAY, Duration::from_millis),
            rng_seed: parse_opt(&lookup, "CHEF_RNG_SEED")?,
            poll_timeout: parse_opt::<u64, _>(&lookup, "CHEF_POLL_TIMEOUT_SECS")?
                .map_or(DEFAULT_POLL_TIMEOUT, Duration::from_secs),
        })
    }
}

fn parse_opt<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

fn parse_or<T, F>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    Ok(parse_opt(lookup, name)?.unwrap_or(default))
}
