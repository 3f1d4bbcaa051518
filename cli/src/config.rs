//! Runtime configuration for the `items` binary.
//!
//! The backend base URL comes from, in order: the `--base-url` flag, the
//! `ITEMS_API_URL` environment variable (a `.env` file is loaded first), and
//! finally [`DEFAULT_BASE_URL`].

use items_core::QueryConfig;

/// Environment variable holding the backend base URL.
pub const BASE_URL_VAR: &str = "ITEMS_API_URL";

/// Where the backend listens during local development.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("base URL {0:?} must start with http:// or https://")]
    InvalidBaseUrl(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub query: QueryConfig,
}

impl Config {
    /// Resolve configuration from the process environment.
    pub fn load(base_url_flag: Option<&str>) -> Result<Self, ConfigError> {
        Self::resolve(base_url_flag, |key| std::env::var(key).ok())
    }

    /// Resolve configuration with an explicit variable lookup.
    pub fn resolve<F>(base_url_flag: Option<&str>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = base_url_flag
            .map(str::to_string)
            .or_else(|| lookup(BASE_URL_VAR).filter(|url| !url.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = base_url.trim().to_string();

        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(base_url));
        }

        Ok(Self {
            base_url,
            query: QueryConfig::default(),
        })
    }
}
