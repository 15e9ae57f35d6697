//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Generative content-analysis service settings
    #[serde(default)]
    pub analyzer: AnalyzerConfig,

    /// Backend import endpoint settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Accepted input files
    #[serde(default)]
    pub input: InputConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.analyzer.endpoint.trim().is_empty() {
            return Err(AppError::config("analyzer.endpoint is empty"));
        }
        url::Url::parse(&self.analyzer.endpoint)?;
        if self.analyzer.api_key_env.trim().is_empty() {
            return Err(AppError::config("analyzer.api_key_env is empty"));
        }
        if self.analyzer.timeout_secs == 0 {
            return Err(AppError::config("analyzer.timeout_secs must be > 0"));
        }
        if self.analyzer.user_agent.trim().is_empty() {
            return Err(AppError::config("analyzer.user_agent is empty"));
        }
        url::Url::parse(&self.backend.base_url)?;
        if !self.backend.import_path.starts_with('/') {
            return Err(AppError::config("backend.import_path must start with '/'"));
        }
        if self.backend.timeout_secs == 0 {
            return Err(AppError::config("backend.timeout_secs must be > 0"));
        }
        if self.input.max_images == 0 {
            return Err(AppError::config("input.max_images must be > 0"));
        }
        Ok(())
    }
}

/// Content-analysis service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Full `generateContent` URL, without the key parameter
    #[serde(default = "defaults::analyzer_endpoint")]
    pub endpoint: String,

    /// Environment variable holding the API key
    #[serde(default = "defaults::api_key_env")]
    pub api_key_env: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::analyzer_timeout")]
    pub timeout_secs: u64,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,
}

impl AnalyzerConfig {
    /// Read the API key from the configured environment variable.
    pub fn api_key(&self) -> Result<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                AppError::config(format!(
                    "environment variable {} is not set",
                    self.api_key_env
                ))
            })
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::analyzer_endpoint(),
            api_key_env: defaults::api_key_env(),
            timeout_secs: defaults::analyzer_timeout(),
            user_agent: defaults::user_agent(),
        }
    }
}

/// Backend import endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Scheme, host and port of the REST backend
    #[serde(default = "defaults::backend_base_url")]
    pub base_url: String,

    /// Path of the import endpoint
    #[serde(default = "defaults::import_path")]
    pub import_path: String,

    /// Environment variable holding an optional bearer token
    #[serde(default = "defaults::token_env")]
    pub token_env: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::backend_timeout")]
    pub timeout_secs: u64,
}

impl BackendConfig {
    /// Absolute URL of the import endpoint.
    pub fn import_url(&self) -> Result<url::Url> {
        let base = url::Url::parse(&self.base_url)?;
        Ok(base.join(&self.import_path)?)
    }

    /// Bearer token from the environment, if one is set.
    pub fn token(&self) -> Option<String> {
        std::env::var(&self.token_env)
            .ok()
            .filter(|token| !token.trim().is_empty())
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::backend_base_url(),
            import_path: defaults::import_path(),
            token_env: defaults::token_env(),
            timeout_secs: defaults::backend_timeout(),
        }
    }
}

/// Accepted input file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Extensions that load as plain text without comment
    #[serde(default = "defaults::text_extensions")]
    pub text_extensions: Vec<String>,

    /// Extensions that load, but with a conversion hint
    #[serde(default = "defaults::warn_extensions")]
    pub warn_extensions: Vec<String>,

    /// Upper bound on pages per scan
    #[serde(default = "defaults::max_images")]
    pub max_images: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            text_extensions: defaults::text_extensions(),
            warn_extensions: defaults::warn_extensions(),
            max_images: defaults::max_images(),
        }
    }
}

mod defaults {
    // Analyzer defaults
    pub fn analyzer_endpoint() -> String {
        "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
            .into()
    }
    pub fn api_key_env() -> String {
        "GEMINI_API_KEY".into()
    }
    pub fn analyzer_timeout() -> u64 {
        120
    }
    pub fn user_agent() -> String {
        crate::utils::http::USER_AGENT.into()
    }

    // Backend defaults
    pub fn backend_base_url() -> String {
        "http://localhost:8080".into()
    }
    pub fn import_path() -> String {
        "/api/books/import".into()
    }
    pub fn token_env() -> String {
        "BOOK_IMPORT_TOKEN".into()
    }
    pub fn backend_timeout() -> u64 {
        30
    }

    // Input defaults
    pub fn text_extensions() -> Vec<String> {
        vec!["txt".into(), "md".into()]
    }
    pub fn warn_extensions() -> Vec<String> {
        vec!["pdf".into(), "docx".into()]
    }
    pub fn max_images() -> usize {
        20
    }
}
