//! Client configuration parsed from environment variables.

pub const DEFAULT_API_BASE_URL: &str = "https://cementai-backend-91492777049.us-central1.run.app";
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Errors produced while validating configuration.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid base URL '{0}': expected http:// or https://")]
    InvalidBaseUrl(String),

    #[error("refresh interval must be at least one second")]
    ZeroRefreshInterval,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend base URL without a trailing slash.
    pub base_url: String,
    pub refresh_interval_secs: u64,
    pub timeouts: ClientTimeouts,
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `CEMENTAI_API_URL`: backend base URL, deployed backend when absent
    /// - `CEMENTAI_REFRESH_SECS`: default 60
    /// - `CEMENTAI_REQUEST_TIMEOUT_SECS`: default 30
    /// - `CEMENTAI_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not http(s) or the refresh
    /// interval is zero.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = std::env::var("CEMENTAI_API_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_owned());
        let config = Self {
            base_url: normalize_base_url(&base_url)?,
            refresh_interval_secs: env_parse("CEMENTAI_REFRESH_SECS", DEFAULT_REFRESH_INTERVAL_SECS),
            timeouts: ClientTimeouts {
                request_secs: env_parse("CEMENTAI_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
                connect_secs: env_parse("CEMENTAI_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Replace the base URL, applying the same normalization as `from_env`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] for non-http(s) URLs.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ConfigError> {
        self.base_url = normalize_base_url(base_url)?;
        Ok(self)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroRefreshInterval`] for zero.
    pub fn with_refresh_interval(mut self, secs: u64) -> Result<Self, ConfigError> {
        self.refresh_interval_secs = secs;
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_interval_secs == 0 {
            return Err(ConfigError::ZeroRefreshInterval);
        }
        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_owned(),
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            timeouts: ClientTimeouts {
                request_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
                connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            },
        }
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::InvalidBaseUrl(raw.to_owned()));
    }
    Ok(trimmed.to_owned())
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
