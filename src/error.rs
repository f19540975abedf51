//! Client error taxonomy.
//!
//! ERROR HANDLING
//! ==============
//! Nothing in this crate retries or recovers: every failure is returned to
//! the caller, which owns display and retry policy. `Auth` and `Api` render
//! as exactly the user-facing message so callers can show `err.to_string()`.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use serde_json::Value;

/// Message shown when the backend cannot be reached at all.
pub const CONNECTION_MESSAGE: &str = "Unable to connect to server. Is the backend running?";

/// Errors produced by session, API, and configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request never produced a response (DNS, refused, reset, TLS).
    #[error("{message}")]
    Connection { message: String },

    /// The request exceeded the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// An auth endpoint answered with a non-success status.
    #[error("{message}")]
    Auth { status: u16, message: String },

    /// A resource endpoint answered with a non-success status.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// A success response body did not match the expected shape.
    #[error("response decode failed: {0}")]
    Decode(String),

    /// Durable token storage could not be read or written.
    #[error("token storage failed: {0}")]
    Storage(String),

    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    Config(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ClientError {
    /// Stable machine-readable code for logs and CLI output.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Connection { .. } => "E_CONNECTION",
            Self::Timeout => "E_TIMEOUT",
            Self::Auth { .. } => "E_AUTH",
            Self::Api { .. } => "E_API",
            Self::Decode(_) => "E_DECODE",
            Self::Storage(_) => "E_STORAGE",
            Self::Config(_) => "E_CONFIG",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    /// HTTP status for errors that carry one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Auth { status, .. } | Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Map a `reqwest` send failure to `Connection` or `Timeout`.
    pub(crate) fn transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout;
        }
        tracing::debug!(error = %err, "transport failure");
        Self::Connection { message: CONNECTION_MESSAGE.to_owned() }
    }
}

/// Pull a user-facing message out of an error response body.
///
/// Accepts the backend's `{"detail": "..."}` shape as well as validation
/// errors where `detail` is a list of `{"msg": "..."}` entries. Returns
/// `None` for non-JSON bodies or bodies without a usable `detail`.
pub(crate) fn detail_message(body: &str) -> Option<String> {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return None;
    };
    match value.get("detail")? {
        Value::String(detail) if !detail.is_empty() => Some(detail.clone()),
        Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if messages.is_empty() { None } else { Some(messages.join("; ")) }
        }
        _ => None,
    }
}

/// Read an error response body. An unreadable body reads as empty so the
/// caller falls back to its generic message instead of a transport error.
pub(crate) async fn error_body(response: reqwest::Response) -> String {
    match response.text().await {
        Ok(body) => body,
        Err(e) => {
            tracing::debug!(error = %e, "error body unreadable");
            String::new()
        }
    }
}
