use std::time::Duration;

use anyhow::{Context, Result};

use crate::llm_client::{Credential, ProviderId};

const DEFAULT_ANALYSIS_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SESSION_TTL_SECS: u64 = 30 * 60;
const DEFAULT_MAX_SESSIONS: usize = 1_000;

/// Application configuration loaded from environment variables.
///
/// Only numeric values are validated; every provider key is optional because
/// keys can also be saved at runtime through the settings API.
#[derive(Debug, Clone)]
pub struct Config {
    /// `None` runs with in-memory settings and candidates.
    pub database_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
    /// Provider used when no settings have been saved.
    pub ai_provider: ProviderId,
    pub gemini_api_key: Option<String>,
    pub cohere_api_key: Option<String>,
    pub huggingface_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub gemini_api_url: Option<String>,
    pub cohere_api_url: Option<String>,
    pub huggingface_api_url: Option<String>,
    pub anthropic_api_url: Option<String>,
    pub huggingface_model: Option<String>,
    pub analysis_timeout: Duration,
    /// Sessions untouched for this long are evicted.
    pub session_ttl: Duration,
    pub max_sessions: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_url: None,
            port: 8080,
            rust_log: "info".to_string(),
            ai_provider: ProviderId::Gemini,
            gemini_api_key: None,
            cohere_api_key: None,
            huggingface_api_key: None,
            anthropic_api_key: None,
            gemini_api_url: None,
            cohere_api_url: None,
            huggingface_api_url: None,
            anthropic_api_url: None,
            huggingface_model: None,
            analysis_timeout: Duration::from_secs(DEFAULT_ANALYSIS_TIMEOUT_SECS),
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let ai_provider = match optional_env("AI_PROVIDER") {
            Some(raw) => raw
                .parse::<ProviderId>()
                .context("AI_PROVIDER must be one of gemini, cohere, huggingface, anthropic")?,
            None => ProviderId::Gemini,
        };

        let analysis_timeout = match optional_env("ANALYSIS_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(
                raw.parse::<u64>()
                    .context("ANALYSIS_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            None => Duration::from_secs(DEFAULT_ANALYSIS_TIMEOUT_SECS),
        };

        let session_ttl = match optional_env("SESSION_TTL_SECS") {
            Some(raw) => Duration::from_secs(
                raw.parse::<u64>()
                    .context("SESSION_TTL_SECS must be a whole number of seconds")?,
            ),
            None => Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
        };

        let max_sessions = match optional_env("MAX_SESSIONS") {
            Some(raw) => raw
                .parse::<usize>()
                .context("MAX_SESSIONS must be a positive whole number")?,
            None => DEFAULT_MAX_SESSIONS,
        };

        Ok(Config {
            database_url: optional_env("DATABASE_URL"),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            ai_provider,
            gemini_api_key: optional_env("GEMINI_API_KEY"),
            cohere_api_key: optional_env("COHERE_API_KEY"),
            huggingface_api_key: optional_env("HUGGINGFACE_API_KEY"),
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            gemini_api_url: optional_env("GEMINI_API_URL"),
            cohere_api_url: optional_env("COHERE_API_URL"),
            huggingface_api_url: optional_env("HUGGINGFACE_API_URL"),
            anthropic_api_url: optional_env("ANTHROPIC_API_URL"),
            huggingface_model: optional_env("HUGGINGFACE_MODEL"),
            analysis_timeout,
            session_ttl,
            max_sessions,
        })
    }

    /// Key configured in the environment for `provider`, if any.
    pub fn env_api_key(&self, provider: ProviderId) -> Option<&str> {
        match provider {
            ProviderId::Gemini => self.gemini_api_key.as_deref(),
            ProviderId::Cohere => self.cohere_api_key.as_deref(),
            ProviderId::HuggingFace => self.huggingface_api_key.as_deref(),
            ProviderId::Anthropic => self.anthropic_api_key.as_deref(),
        }
    }

    /// Builds a credential for `provider`, applying any endpoint/model overrides.
    pub fn credential(&self, provider: ProviderId, api_key: impl Into<String>) -> Credential {
        let mut credential = Credential::new(provider, api_key);
        let endpoint = match provider {
            ProviderId::Gemini => self.gemini_api_url.as_deref(),
            ProviderId::Cohere => self.cohere_api_url.as_deref(),
            ProviderId::HuggingFace => self.huggingface_api_url.as_deref(),
            ProviderId::Anthropic => self.anthropic_api_url.as_deref(),
        };
        if let Some(endpoint) = endpoint {
            credential = credential.with_endpoint(endpoint);
        }
        if provider == ProviderId::HuggingFace {
            if let Some(model) = &self.huggingface_model {
                credential = credential.with_model(model.as_str());
            }
        }
        credential
    }
}

/// Reads a variable, treating unset and blank the same.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
