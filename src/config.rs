//! Runtime configuration
//!
//! Everything is read from the process environment (after loading `.env`)
//! once at startup and handed to components explicitly.

use crate::error::BeaconError;
use crate::Result;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PRIMARY_MODEL: &str = "gpt-4-turbo";
pub const DEFAULT_FALLBACK_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Settings for the completion API
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub primary_model: String,
    pub fallback_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub request_timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            primary_model: DEFAULT_PRIMARY_MODEL.to_string(),
            fallback_model: DEFAULT_FALLBACK_MODEL.to_string(),
            temperature: 0.7,
            max_tokens: 500,
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl LlmConfig {
    /// Placeholder keys copied from `.env.example` count as missing.
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty() && self.api_key != "your_openai_api_key_here"
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm: LlmConfig,
    /// Spend ceiling per conversation, in dollars
    pub max_budget_dollars: f64,
    pub port: u16,
    pub database_url: Option<String>,
    pub session_ttl: Duration,
    pub property_data_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            max_budget_dollars: 1.0,
            port: 8080,
            database_url: None,
            session_ttl: Duration::from_secs(60 * 60),
            property_data_file: None,
        }
    }
}

impl AppConfig {
    /// Load `.env` (if present) and read the process environment.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = AppConfig::default();

        let llm = LlmConfig {
            api_key: get("OPENAI_API_KEY").unwrap_or_default(),
            base_url: get("OPENAI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.llm.base_url),
            primary_model: get("OPENAI_MODEL").unwrap_or(defaults.llm.primary_model),
            fallback_model: get("OPENAI_FALLBACK_MODEL").unwrap_or(defaults.llm.fallback_model),
            temperature: parse_or(get("LLM_TEMPERATURE"), "LLM_TEMPERATURE", defaults.llm.temperature)?,
            max_tokens: parse_or(get("LLM_MAX_TOKENS"), "LLM_MAX_TOKENS", defaults.llm.max_tokens)?,
            request_timeout: Duration::from_secs(parse_or(
                get("LLM_TIMEOUT_SECS"),
                "LLM_TIMEOUT_SECS",
                defaults.llm.request_timeout.as_secs(),
            )?),
        };

        let max_budget_dollars = parse_or(
            get("MAX_BUDGET_DOLLARS"),
            "MAX_BUDGET_DOLLARS",
            defaults.max_budget_dollars,
        )?;
        if !max_budget_dollars.is_finite() || max_budget_dollars < 0.0 {
            return Err(BeaconError::ConfigError(format!(
                "MAX_BUDGET_DOLLARS must be a non-negative number, got {}",
                max_budget_dollars
            )));
        }

        let port = parse_or(get("PORT").or_else(|| get("API_PORT")), "PORT", defaults.port)?;

        let ttl_minutes: u64 = parse_or(
            get("SESSION_TTL_MINUTES"),
            "SESSION_TTL_MINUTES",
            defaults.session_ttl.as_secs() / 60,
        )?;
        let ttl_secs = ttl_minutes.checked_mul(60).ok_or_else(|| {
            BeaconError::ConfigError(format!(
                "SESSION_TTL_MINUTES is too large: {}",
                ttl_minutes
            ))
        })?;

        Ok(Self {
            llm,
            max_budget_dollars,
            port,
            database_url: get("DATABASE_URL").or_else(|| get("POSTGRES_URL")),
            session_ttl: Duration::from_secs(ttl_secs),
            property_data_file: get("PROPERTY_DATA_FILE").map(PathBuf::from),
        })
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw.parse::<T>().map_err(|e| {
            BeaconError::ConfigError(format!("{} has invalid value '{}': {}", key, raw, e))
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.llm.primary_model, "gpt-4-turbo");
        assert_eq!(config.llm.fallback_model, "gpt-3.5-turbo");
        assert_eq!(config.max_budget_dollars, 1.0);
        assert_eq!(config.port, 8080);
        assert!(config.database_url.is_none());
        assert!(!config.llm.has_api_key());
    }

    #[test]
    fn test_reads_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_MODEL", "gpt-4-turbo-preview"),
            ("MAX_BUDGET_DOLLARS", "0.25"),
            ("API_PORT", "9090"),
            ("POSTGRES_URL", "postgres://localhost/beacon"),
            ("SESSION_TTL_MINUTES", "5"),
            ("OPENAI_BASE_URL", "http://localhost:4000/v1/"),
        ]))
        .unwrap();

        assert!(config.llm.has_api_key());
        assert_eq!(config.llm.primary_model, "gpt-4-turbo-preview");
        assert_eq!(config.llm.base_url, "http://localhost:4000/v1");
        assert_eq!(config.max_budget_dollars, 0.25);
        assert_eq!(config.port, 9090);
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/beacon"));
        assert_eq!(config.session_ttl, Duration::from_secs(300));
    }

    #[test]
    fn test_rejects_invalid_numbers() {
        let err = AppConfig::from_lookup(lookup_from(&[("MAX_BUDGET_DOLLARS", "lots")]))
            .unwrap_err();
        assert!(err.to_string().contains("MAX_BUDGET_DOLLARS"));

        let err = AppConfig::from_lookup(lookup_from(&[("MAX_BUDGET_DOLLARS", "-1")]))
            .unwrap_err();
        assert!(matches!(err, BeaconError::ConfigError(_)));
    }

    #[test]
    fn test_rejects_session_ttl_overflow() {
        let huge = (u64::MAX / 60 + 1).to_string();
        let err = AppConfig::from_lookup(lookup_from(&[("SESSION_TTL_MINUTES", huge.as_str())]))
            .unwrap_err();
        assert!(matches!(err, BeaconError::ConfigError(_)));
        assert!(err.to_string().contains("SESSION_TTL_MINUTES"));
    }

    #[test]
    fn test_placeholder_key_counts_as_missing() {
        let config = AppConfig::from_lookup(lookup_from(&[(
            "OPENAI_API_KEY",
            "your_openai_api_key_here",
        )]))
        .unwrap();
        assert!(!config.llm.has_api_key());
    }
}
