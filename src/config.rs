//! Client configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;

use crate::error::ClientError;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const STATE_DIR_NAME: &str = ".medbrief";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientTimeouts {
    /// Whole-request timeout; `None` waits indefinitely.
    pub request_secs: Option<u64>,
    pub connect_secs: u64,
}

impl Default for ClientTimeouts {
    fn default() -> Self {
        Self { request_secs: None, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: Url,
    pub state_dir: PathBuf,
    pub timeouts: ClientTimeouts,
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `MEDBRIEF_BASE_URL`: backend origin, default `http://127.0.0.1:8000`
    /// - `MEDBRIEF_STATE_DIR`: token directory, default `$HOME/.medbrief`
    /// - `MEDBRIEF_REQUEST_TIMEOUT_SECS`: unset or `0` disables the timeout
    /// - `MEDBRIEF_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if the base URL does not parse.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if the base URL does not parse.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = parse_base_url(lookup("MEDBRIEF_BASE_URL").as_deref().unwrap_or(DEFAULT_BASE_URL))?;
        let state_dir = lookup("MEDBRIEF_STATE_DIR").map_or_else(
            || default_state_dir(lookup("HOME").as_deref()),
            PathBuf::from,
        );
        let request_secs = parse_u64(lookup("MEDBRIEF_REQUEST_TIMEOUT_SECS").as_deref()).filter(|secs| *secs > 0);
        let connect_secs = parse_u64(lookup("MEDBRIEF_CONNECT_TIMEOUT_SECS").as_deref())
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS);

        Ok(Self { base_url, state_dir, timeouts: ClientTimeouts { request_secs, connect_secs } })
    }

    /// Build the shared HTTP client with the configured timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::HttpClientBuild`] if `reqwest` rejects the settings.
    pub fn http_client(&self) -> Result<reqwest::Client, ClientError> {
        let mut builder =
            reqwest::Client::builder().connect_timeout(Duration::from_secs(self.timeouts.connect_secs));
        if let Some(secs) = self.timeouts.request_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        builder.build().map_err(|e| ClientError::HttpClientBuild(e.to_string()))
    }
}

/// Parse a backend origin, dropping any trailing `/`.
///
/// # Errors
///
/// Returns [`ClientError::Config`] for unparseable or non-HTTP URLs.
pub fn parse_base_url(raw: &str) -> Result<Url, ClientError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed).map_err(|e| ClientError::Config(format!("invalid base URL '{raw}': {e}")))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ClientError::Config(format!("base URL must be http(s): '{raw}'")));
    }
    Ok(url)
}

fn default_state_dir(home: Option<&str>) -> PathBuf {
    match home {
        Some(home) if !home.is_empty() => PathBuf::from(home).join(STATE_DIR_NAME),
        _ => PathBuf::from(STATE_DIR_NAME),
    }
}

fn parse_u64(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
}
