//! Client configuration parsed from environment variables.

use std::path::PathBuf;

use crate::auth::session::DEFAULT_REFRESH_THRESHOLD_SECS;

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_TOKEN_FILE: &str = ".pipeline/token";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a non-negative integer, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },
    #[error("{var} must not be empty")]
    Empty { var: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend origin, without a trailing `/`.
    pub api_url: String,
    /// Remaining lifetime below which a token is refreshed before use.
    pub refresh_threshold_secs: i64,
    /// Where the native token slot is persisted.
    pub token_file: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            refresh_threshold_secs: DEFAULT_REFRESH_THRESHOLD_SECS,
            token_file: PathBuf::from(DEFAULT_TOKEN_FILE),
        }
    }
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `PIPELINE_API_URL`: default `http://localhost:8080`
    /// - `PIPELINE_REFRESH_THRESHOLD_SECS`: default 300
    /// - `PIPELINE_TOKEN_FILE`: default `.pipeline/token`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an empty URL or a malformed threshold.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let api_url = match std::env::var("PIPELINE_API_URL") {
            Ok(raw) => normalize_url(&raw).ok_or(ConfigError::Empty { var: "PIPELINE_API_URL" })?,
            Err(_) => defaults.api_url,
        };
        let refresh_threshold_secs =
            env_parse_secs("PIPELINE_REFRESH_THRESHOLD_SECS", defaults.refresh_threshold_secs)?;
        let token_file = std::env::var("PIPELINE_TOKEN_FILE")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map_or(defaults.token_file, PathBuf::from);

        Ok(Self { api_url, refresh_threshold_secs, token_file })
    }

    #[must_use]
    pub fn with_api_url(mut self, url: &str) -> Self {
        if let Some(url) = normalize_url(url) {
            self.api_url = url;
        }
        self
    }
}

fn normalize_url(raw: &str) -> Option<String> {
    let url = raw.trim().trim_end_matches('/');
    (!url.is_empty()).then(|| url.to_owned())
}

fn env_parse_secs(var: &'static str, default: i64) -> Result<i64, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<u32>()
            .map(i64::from)
            .map_err(|_| ConfigError::InvalidNumber { var, value: raw }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
