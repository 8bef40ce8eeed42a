//! Configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result, bail};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the Heroku AppLink API.
    pub applink_api_url: String,

    /// Bearer token for the AppLink API.
    pub applink_token: String,

    /// Name of the AppLink connection to authorize (default: datacloud_org).
    pub connection_name: String,

    /// Per-request HTTP timeout in seconds (default: 30).
    pub http_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's value
    /// when it is set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let applink_api_url = lookup("HEROKU_APPLINK_API_URL")
            .context("HEROKU_APPLINK_API_URL environment variable is required")?;

        let applink_token = lookup("HEROKU_APPLINK_TOKEN")
            .context("HEROKU_APPLINK_TOKEN environment variable is required")?;

        let connection_name =
            lookup("APPLINK_CONNECTION_NAME").unwrap_or_else(|| "datacloud_org".to_string());

        let http_timeout_secs: u64 = lookup("HTTP_TIMEOUT_SECS")
            .unwrap_or_else(|| "30".to_string())
            .parse()
            .context("HTTP_TIMEOUT_SECS must be a valid u64")?;

        if http_timeout_secs == 0 {
            bail!("HTTP_TIMEOUT_SECS must be greater than zero");
        }

        Ok(Self {
            applink_api_url: applink_api_url.trim_end_matches('/').to_string(),
            applink_token,
            connection_name,
            http_timeout_secs,
        })
    }

    /// HTTP timeout as a Duration.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
