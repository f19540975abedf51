//! REST API client for the MedBrief resource endpoints.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every resource call goes through [`ApiClient::request`], which merges the
//! JSON content type, the session's bearer header, and caller overrides (in
//! that order, later wins).
//!
//! DESIGN
//! ======
//! Calls return [`ApiFuture`] rather than being `async fn`: headers are read
//! from the session when the method is called, not when the future is first
//! polled. A logout that lands while a request is pending does not change
//! that request, and a new token is picked up by the next call.
//!
//! ERROR HANDLING
//! ==============
//! Non-2xx statuses become [`ClientError::Api`] carrying the body's `detail`
//! or `HTTP <status>`. Nothing is retried.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use futures::FutureExt;
use futures::future::BoxFuture;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::endpoint::Endpoint;
use crate::error::{ClientError, detail_message, error_body};
use crate::session::SessionStore;
use crate::types::{Article, BriefOptions, BriefWindow, DeleteResponse, Health, Journal, Profile};

/// A pending API call whose request headers are already fixed.
pub type ApiFuture<T> = BoxFuture<'static, Result<T, ClientError>>;

/// Per-call request settings.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    pub method: Method,
    /// Applied last; replaces defaults and auth headers with the same name.
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl RequestOptions {
    #[must_use]
    pub fn new(method: Method) -> Self {
        Self { method, ..Self::default() }
    }

    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Content type default, then `auth`, then `overrides`.
pub(crate) fn merge_headers(auth: HeaderMap, overrides: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.extend(auth);
    headers.extend(overrides.clone());
    headers
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    session: SessionStore,
}

impl ApiClient {
    pub fn new(http: reqwest::Client, base_url: Url, session: SessionStore) -> Self {
        Self { http, base_url, session }
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Issue an authenticated request and decode the JSON response.
    ///
    /// # Errors
    ///
    /// The returned future resolves to [`ClientError::Api`] on a non-2xx status,
    /// [`ClientError::Connection`] or [`ClientError::Timeout`] on transport
    /// failure, and [`ClientError::Decode`] if the body does not match `T`.
    pub fn request<T>(&self, endpoint: impl Into<Endpoint>, options: RequestOptions) -> ApiFuture<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let endpoint = endpoint.into();
        let url = endpoint.resolve(&self.base_url);
        let headers = merge_headers(self.session.auth_headers(), &options.headers);
        let method = options.method;

        let mut builder = self.http.request(method.clone(), url).headers(headers);
        if let Some(body) = options.body {
            builder = builder.body(body.to_string());
        }

        async move {
            let response = builder.send().await.map_err(|e| ClientError::transport(&e))?;
            let status = response.status();
            tracing::debug!(%method, %endpoint, status = status.as_u16(), "api response");

            if !status.is_success() {
                let body = error_body(response).await;
                let message = detail_message(&body).unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
                return Err(ClientError::Api { status: status.as_u16(), message });
            }

            let body = response.text().await.map_err(|e| ClientError::transport(&e))?;
            serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
        }
        .boxed()
    }

    // =========================================================================
    // JOURNALS
    // =========================================================================

    pub fn search_journals(&self, query: &str) -> ApiFuture<Vec<Journal>> {
        let endpoint = Endpoint::new("/api/journals/search").query("q", query);
        self.request(endpoint, RequestOptions::default())
    }

    pub fn get_preset_journals(&self, category: &str) -> ApiFuture<Vec<Journal>> {
        let endpoint = Endpoint::new("/api/journals/presets").segment(category);
        self.request(endpoint, RequestOptions::default())
    }

    /// Journals for `ids`; resolves to an empty list without a network call
    /// when `ids` is `None` or empty.
    pub fn get_journals_by_ids(&self, ids: Option<&[i64]>) -> ApiFuture<Vec<Journal>> {
        match journals_by_ids_endpoint(ids) {
            Some(endpoint) => self.request(endpoint, RequestOptions::default()),
            None => futures::future::ready(Ok(Vec::new())).boxed(),
        }
    }

    // =========================================================================
    // PROFILES
    // =========================================================================

    pub fn get_profiles(&self) -> ApiFuture<Vec<Profile>> {
        self.request("/api/profiles/", RequestOptions::default())
    }

    pub fn create_profile(&self, name: &str, journal_ids: &[i64]) -> ApiFuture<Profile> {
        let options = RequestOptions::new(Method::POST).json(profile_body(name, journal_ids));
        self.request("/api/profiles/", options)
    }

    pub fn update_profile(&self, profile_id: i64, name: &str, journal_ids: &[i64]) -> ApiFuture<Profile> {
        let options = RequestOptions::new(Method::PUT).json(profile_body(name, journal_ids));
        self.request(profile_endpoint(profile_id), options)
    }

    pub fn delete_profile(&self, profile_id: i64) -> ApiFuture<DeleteResponse> {
        self.request(profile_endpoint(profile_id), RequestOptions::new(Method::DELETE))
    }

    // =========================================================================
    // BRIEFS
    // =========================================================================

    /// Articles for a profile over a date range or trailing window.
    pub fn generate_brief(&self, profile_id: i64, options: &BriefOptions) -> ApiFuture<Vec<Article>> {
        self.request(brief_endpoint(profile_id, options), RequestOptions::default())
    }

    /// Backend liveness probe.
    pub fn health(&self) -> ApiFuture<Health> {
        self.request("/health", RequestOptions::default())
    }
}

pub(crate) fn journals_by_ids_endpoint(ids: Option<&[i64]>) -> Option<Endpoint> {
    let ids = ids.filter(|ids| !ids.is_empty())?;
    let joined = ids
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");
    Some(Endpoint::new("/api/journals/by-ids").query("ids", joined))
}

pub(crate) fn brief_endpoint(profile_id: i64, options: &BriefOptions) -> Endpoint {
    let endpoint = Endpoint::new("/api/briefs/generate").query("profile_id", profile_id.to_string());
    match options.window() {
        BriefWindow::Range { from, to } => endpoint.query("from_date", from).query("to_date", to),
        BriefWindow::Days(days) => endpoint.query("days", days.to_string()),
    }
}

fn profile_endpoint(profile_id: i64) -> Endpoint {
    Endpoint::new("/api/profiles").segment(profile_id.to_string())
}

fn profile_body(name: &str, journal_ids: &[i64]) -> Value {
    serde_json::json!({ "name": name, "journal_ids": journal_ids })
}
