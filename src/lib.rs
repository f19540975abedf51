//! # medbrief
//!
//! Client shell for the MedBrief backend: session state, the authenticated
//! REST client, and guarded client-side routing.
//!
//! SYSTEM CONTEXT
//! ==============
//! Router -> guard reads [`session::SessionStore`] -> view -> [`api::ApiClient`]
//! -> session headers -> backend. [`AppContext`] owns one of each and wires
//! them to a single shared session; nothing here is a global.

pub mod api;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod router;
pub mod session;
pub mod storage;
pub mod types;

#[cfg(test)]
mod test_support;


use std::sync::Arc;

pub use api::{ApiClient, ApiFuture, RequestOptions};
pub use config::ClientConfig;
pub use error::ClientError;
pub use router::{Navigation, Router, RouterError, View};
pub use session::{Session, SessionStore};
pub use storage::{FileStorage, MemoryStorage, TokenStorage};

/// Application root: one session shared by the API client and the router.
pub struct AppContext {
    pub session: SessionStore,
    pub api: ApiClient,
    pub router: Router,
}

impl AppContext {
    /// Build the context from config, persisting the token under `state_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::HttpClientBuild`] if the HTTP client cannot be built.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        let storage = Arc::new(FileStorage::new(config.state_dir.clone()));
        Self::with_storage(config, storage)
    }

    /// Build the context with caller-supplied token storage.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::HttpClientBuild`] if the HTTP client cannot be built.
    pub fn with_storage(config: &ClientConfig, storage: Arc<dyn TokenStorage>) -> Result<Self, ClientError> {
        let http = config.http_client()?;
        let session = SessionStore::new(http.clone(), config.base_url.clone(), storage);
        let api = ApiClient::new(http, config.base_url.clone(), session.clone());
        let router = Router::new(session.clone());
        tracing::debug!(base_url = %config.base_url, "app context ready");
        Ok(Self { session, api, router })
    }
}
