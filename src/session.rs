//! Auth-session state for the current client instance.
//!
//! SYSTEM CONTEXT
//! ==============
//! The application root owns one [`SessionStore`] and hands clones of it to
//! the router guard and the API client. All clones share one session held in
//! a `tokio::sync::watch` channel, so observers see every login and logout.
//!
//! DESIGN
//! ======
//! `is_authenticated` is computed from the token on every read, never
//! stored. Only the token is persisted; the user record lives in memory.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, Url};
use tokio::sync::watch;

use crate::endpoint::Endpoint;
use crate::error::{ClientError, detail_message, error_body};
use crate::storage::{TOKEN_KEY, TokenStorage};
use crate::types::{Credentials, SessionUser, TokenResponse};

const LOGIN_FALLBACK: &str = "Login failed";
const REGISTER_FALLBACK: &str = "Registration failed";

/// Authenticated identity of this client.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<SessionUser>,
}

impl Session {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// Shared handle to the session. Cloning is cheap and shares state.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

struct Inner {
    http: reqwest::Client,
    base_url: Url,
    storage: Arc<dyn TokenStorage>,
    state: watch::Sender<Session>,
}

impl SessionStore {
    /// Create the store, rehydrating the token from `storage`.
    ///
    /// A stored token that is unreadable, blank, or not a valid header value
    /// starts the session logged out.
    pub fn new(http: reqwest::Client, base_url: Url, storage: Arc<dyn TokenStorage>) -> Self {
        let token = match storage.load(TOKEN_KEY) {
            Ok(raw) => match normalize_token(raw) {
                Some(token) if bearer_value(&token).is_none() => {
                    tracing::warn!("stored token is not a valid header value; starting logged out");
                    None
                }
                token => token,
            },
            Err(e) => {
                tracing::warn!(error = %e, "stored token unreadable; starting logged out");
                None
            }
        };
        tracing::debug!(restored = token.is_some(), "session store created");
        let (state, _) = watch::channel(Session { token, user: None });
        Self { inner: Arc::new(Inner { http, base_url, storage, state }) }
    }

    // =========================================================================
    // AUTH CALLS
    // =========================================================================

    /// Log in with form-encoded credentials via `POST /auth/login`.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Connection`] / [`ClientError::Timeout`] when the backend is unreachable.
    /// - [`ClientError::Auth`] with the response `detail` (or "Login failed") on a non-2xx status.
    /// - [`ClientError::Decode`] if the success body carries no usable `access_token`.
    /// - [`ClientError::Storage`] if the token cannot be persisted.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenResponse, ClientError> {
        let url = Endpoint::new("/auth/login").resolve(&self.inner.base_url);
        let request = self
            .inner
            .http
            .post(url)
            .form(&[("username", email), ("password", password)]);
        self.authenticate(request, email, LOGIN_FALLBACK).await
    }

    /// Create an account via `POST /auth/register` and log in as it.
    ///
    /// # Errors
    ///
    /// Same as [`SessionStore::login`], with "Registration failed" as the fallback message.
    pub async fn register(&self, email: &str, password: &str) -> Result<TokenResponse, ClientError> {
        let url = Endpoint::new("/auth/register").resolve(&self.inner.base_url);
        let request = self
            .inner
            .http
            .post(url)
            .json(&Credentials { email, password });
        self.authenticate(request, email, REGISTER_FALLBACK).await
    }

    async fn authenticate(
        &self,
        request: RequestBuilder,
        email: &str,
        fallback: &str,
    ) -> Result<TokenResponse, ClientError> {
        let response = request.send().await.map_err(|e| ClientError::transport(&e))?;
        let status = response.status();

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "authentication rejected");
            let body = error_body(response).await;
            let message = detail_message(&body).unwrap_or_else(|| fallback.to_owned());
            return Err(ClientError::Auth { status: status.as_u16(), message });
        }

        let body = response.text().await.map_err(|e| ClientError::transport(&e))?;

        let payload: TokenResponse =
            serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))?;
        let token = normalize_token(Some(payload.access_token.clone()))
            .ok_or_else(|| ClientError::Decode("empty access_token".to_owned()))?;
        if bearer_value(&token).is_none() {
            return Err(ClientError::Decode("access_token is not a valid header value".to_owned()));
        }

        self.inner.storage.store(TOKEN_KEY, &token)?;
        self.inner.state.send_replace(Session {
            token: Some(token),
            user: Some(SessionUser { email: email.to_owned() }),
        });
        tracing::info!(%email, "session authenticated");
        Ok(payload)
    }

    /// Forget the token and user, in memory and in storage. Never fails.
    pub fn logout(&self) {
        self.inner.state.send_replace(Session::default());
        if let Err(e) = self.inner.storage.remove(TOKEN_KEY) {
            tracing::warn!(error = %e, "failed to clear stored token");
        }
        tracing::info!("logged out");
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// `Authorization: Bearer <token>` when logged in, otherwise empty.
    #[must_use]
    pub fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(value) = self.inner.state.borrow().token.as_deref().and_then(bearer_value) {
            headers.insert(AUTHORIZATION, value);
        }
        headers
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.inner.state.borrow().token.clone()
    }

    #[must_use]
    pub fn user(&self) -> Option<SessionUser> {
        self.inner.state.borrow().user.clone()
    }

    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified on every session change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.state.subscribe()
    }
}

fn normalize_token(raw: Option<String>) -> Option<String> {
    raw.map(|t| t.trim().to_owned()).filter(|t| !t.is_empty())
}

fn bearer_value(token: &str) -> Option<HeaderValue> {
    match HeaderValue::from_str(&format!("Bearer {token}")) {
        Ok(mut value) => {
            value.set_sensitive(true);
            Some(value)
        }
        Err(_) => None,
    }
}
