//! Minimal HTTP stub server for registry and upstream WMS tests.
//!
//! Routes are matched on the request path only; every request is recorded
//! with its query so tests can assert on what was sent. Unknown paths get a
//! plain 404.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};

/// Canned response for one path.
#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: u16,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl StubResponse {
    pub fn new(status: u16, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type: content_type.to_string(),
            body: body.into(),
        }
    }

    pub fn yaml(body: &str) -> Self {
        Self::new(200, "application/x-yaml", body)
    }

    pub fn html(status: u16, body: &str) -> Self {
        Self::new(status, "text/html", body)
    }

    pub fn png(body: Vec<u8>) -> Self {
        Self::new(200, "image/png", body)
    }

    pub fn status(status: u16) -> Self {
        Self::new(status, "text/plain", format!("status {}", status))
    }
}

struct StubState {
    routes: HashMap<String, StubResponse>,
    requests: Mutex<Vec<String>>,
}

/// A running stub server bound to an ephemeral localhost port.
///
/// The server task lives as long as the tokio runtime of the test.
pub struct StubServer {
    addr: SocketAddr,
    state: Arc<StubState>,
}

impl StubServer {
    /// Start serving `routes`, keyed by request path.
    pub async fn start<I, P>(routes: I) -> StubServer
    where
        I: IntoIterator<Item = (P, StubResponse)>,
        P: Into<String>,
    {
        let state = Arc::new(StubState {
            routes: routes.into_iter().map(|(p, r)| (p.into(), r)).collect(),
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new().fallback(respond).with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind stub server");
        let addr = listener.local_addr().expect("Stub server has no address");

        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        StubServer { addr, state }
    }

    /// Base URL, e.g. `http://127.0.0.1:40123`.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Every request received so far, as `path?query`.
    pub fn requests(&self) -> Vec<String> {
        self.state
            .requests
            .lock()
            .expect("stub request log poisoned")
            .clone()
    }

    /// Number of requests received for `path`.
    pub fn hits(&self, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.split('?').next() == Some(path))
            .count()
    }

    pub fn total_hits(&self) -> usize {
        self.requests().len()
    }
}

async fn respond(State(state): State<Arc<StubState>>, uri: Uri) -> Response {
    let recorded = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    state
        .requests
        .lock()
        .expect("stub request log poisoned")
        .push(recorded);

    match state.routes.get(uri.path()) {
        Some(stub) => {
            let status = StatusCode::from_u16(stub.status).unwrap_or(StatusCode::OK);
            (
                status,
                [(header::CONTENT_TYPE, stub.content_type.clone())],
                stub.body.clone(),
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, "not found").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_requests_per_path() {
        let server = StubServer::start([("/a", StubResponse::yaml("a: 1"))]).await;
        assert!(server.url().starts_with("http://127.0.0.1:"));
        assert_eq!(server.total_hits(), 0);
        assert_eq!(server.hits("/a"), 0);
    }
}
