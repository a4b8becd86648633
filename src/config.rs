//! API configuration loaded from environment variables with sane defaults.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::path::PathBuf;
use std::time::Duration;

/// Base URL of the dashboard API. Overridden by `ADMINBOARD_API_URL`.
pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";

/// Request timeout in seconds. Overridden by `ADMINBOARD_TIMEOUT_SECS`.
///
/// A finite timeout is required: a hung refresh call must fail like any
/// other network error instead of pinning the session in `Refreshing`.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default credential file location, relative to the working directory.
pub const DEFAULT_CREDENTIALS_PATH: &str = ".adminboard/credentials.json";

const ENV_API_URL: &str = "ADMINBOARD_API_URL";
const ENV_TIMEOUT_SECS: &str = "ADMINBOARD_TIMEOUT_SECS";
const ENV_CREDENTIALS: &str = "ADMINBOARD_CREDENTIALS";

/// Configuration for the HTTP transport and credential store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    pub credentials_path: PathBuf,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_owned(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            credentials_path: PathBuf::from(DEFAULT_CREDENTIALS_PATH),
        }
    }
}

impl ApiConfig {
    /// Load from `ADMINBOARD_API_URL`, `ADMINBOARD_TIMEOUT_SECS`, and
    /// `ADMINBOARD_CREDENTIALS`, falling back to defaults for anything
    /// missing. An unparsable timeout keeps the default and logs a warning.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var(ENV_API_URL) {
            if !url.trim().is_empty() {
                config.base_url = url;
            }
        }

        if let Ok(raw) = std::env::var(ENV_TIMEOUT_SECS) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.request_timeout = Duration::from_secs(secs),
                _ => {
                    tracing::warn!(value = %raw, "invalid {ENV_TIMEOUT_SECS}; keeping default");
                }
            }
        }

        if let Ok(path) = std::env::var(ENV_CREDENTIALS) {
            if !path.trim().is_empty() {
                config.credentials_path = PathBuf::from(path);
            }
        }

        config
    }

    /// Replace the base URL, trimming any trailing slash so path joins
    /// stay predictable.
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_owned();
        self
    }
}
