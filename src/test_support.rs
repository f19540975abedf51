//! In-process stub of the MedBrief backend for async tests.
//!
//! Serves canned responses keyed by method + path and records every request
//! it receives, headers and body included.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use reqwest::Url;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::session::SessionStore;
use crate::storage::{MemoryStorage, TokenStorage};

#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let raw = format!("http://stub{}?{}", self.path, self.query.as_deref().unwrap_or(""));
        Url::parse(&raw).unwrap().query_pairs().into_owned().collect()
    }

    pub fn query_value(&self, key: &str) -> Option<String> {
        self.query_pairs().into_iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

#[derive(Clone)]
struct Canned {
    status: StatusCode,
    content_type: &'static str,
    body: String,
}

#[derive(Default)]
struct StubState {
    routes: HashMap<(String, String), Canned>,
    requests: Vec<RecordedRequest>,
}

type Shared = Arc<Mutex<StubState>>;

#[derive(Clone)]
pub struct StubBackend {
    state: Shared,
    base_url: Url,
}

impl StubBackend {
    pub async fn spawn() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state: Shared = Arc::default();
        let app = Router::new().fallback(handle).with_state(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { state, base_url: Url::parse(&format!("http://{addr}")).unwrap() }
    }

    pub fn base_url(&self) -> Url {
        self.base_url.clone()
    }

    pub fn respond_json(&self, method: Method, path: &str, status: u16, body: serde_json::Value) {
        self.respond_raw(method, path, status, "application/json", &body.to_string());
    }

    pub fn respond_raw(&self, method: Method, path: &str, status: u16, content_type: &'static str, body: &str) {
        let canned = Canned { status: StatusCode::from_u16(status).unwrap(), content_type, body: body.to_owned() };
        self.lock().routes.insert((method.as_str().to_owned(), path.to_owned()), canned);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.lock().requests.last().cloned().unwrap()
    }

    /// Session store against this stub with the given storage.
    pub fn session(&self, storage: Arc<dyn TokenStorage>) -> SessionStore {
        SessionStore::new(reqwest::Client::new(), self.base_url(), storage)
    }

    /// Session store against this stub, already holding `token`.
    pub fn session_with_token(&self, token: &str) -> SessionStore {
        self.session(Arc::new(MemoryStorage::with_entry(crate::storage::TOKEN_KEY, token)))
    }

    fn lock(&self) -> MutexGuard<'_, StubState> {
        self.state.lock().unwrap()
    }
}

async fn handle(State(state): State<Shared>, method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    let path = uri.path().to_owned();
    let recorded = RecordedRequest {
        method: method.clone(),
        path: path.clone(),
        query: uri.query().map(str::to_owned),
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    };
    let canned = {
        let mut guard = state.lock().unwrap();
        guard.requests.push(recorded);
        guard.routes.get(&(method.as_str().to_owned(), path)).cloned()
    };
    match canned {
        Some(c) => (c.status, [(header::CONTENT_TYPE, c.content_type)], c.body).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "application/json")],
            r#"{"detail":"Not Found"}"#.to_owned(),
        )
            .into_response(),
    }
}

/// A base URL nothing is listening on.
pub async fn unreachable_base_url() -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    Url::parse(&format!("http://{addr}")).unwrap()
}

/// A raw server that answers one request with `status` and a body cut short
/// of its declared `content-length`.
pub async fn truncated_body_base_url(status: u16) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;
        let reply = format!(
            "HTTP/1.1 {status} Error\r\ncontent-type: application/json\r\ncontent-length: 200\r\nconnection: close\r\n\r\n{{\"det"
        );
        socket.write_all(reply.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
    });
    Url::parse(&format!("http://{addr}")).unwrap()
}

async fn read_request(socket: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
            let body_len = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + body_len {
                return;
            }
        }
    }
}
