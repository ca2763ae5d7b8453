//! Rendering engine contract.
//!
//! Requests and responses mirror an HTTP exchange: the caller hands over a
//! method, path and query, and gets back a status, headers and a stream of
//! body chunks. Engines deliver the whole image as the first chunk.

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use serde_yaml::Value;
use wms_protocol::GetMapRequest;

use crate::RenderError;

/// Body of a rendering response.
pub type BodyStream = BoxStream<'static, Result<Bytes, RenderError>>;

/// An in-process HTTP-shaped request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub method: String,
    pub path: String,
    /// Encoded query string, without the leading `?`
    pub query: String,
}

impl RenderRequest {
    pub fn get(path: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            method: "GET".to_string(),
            path: path.into(),
            query: query.into(),
        }
    }

    /// A GET for a WMS GetMap request at `path`.
    pub fn get_map(path: &str, request: &GetMapRequest) -> Result<Self, RenderError> {
        Ok(Self::get(path, request.to_query_string()?))
    }

    /// Path and query as they would appear on the request line.
    pub fn uri(&self) -> String {
        if self.query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query)
        }
    }
}

/// Structured result of an engine invocation.
pub struct RenderResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: BodyStream,
}

impl RenderResponse {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: BodyStream) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// A response whose body is delivered as exactly one chunk.
    pub fn single_chunk(status: u16, headers: Vec<(String, String)>, body: impl Into<Bytes>) -> Self {
        let chunk: Result<Bytes, RenderError> = Ok(body.into());
        Self::new(status, headers, stream::iter(std::iter::once(chunk)).boxed())
    }

    /// Header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Pull the next body chunk; `None` once the body is exhausted.
    pub async fn next_chunk(&mut self) -> Option<Result<Bytes, RenderError>> {
        self.body.next().await
    }
}

impl fmt::Debug for RenderResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// An engine that turns map requests into image responses.
///
/// `Ok(None)` means the engine produced no response for the request.
#[async_trait]
pub trait RenderEngine: Send + Sync {
    async fn handle(&self, request: &RenderRequest)
        -> Result<Option<RenderResponse>, RenderError>;
}

/// Builds an engine from a merged configuration document.
pub trait EngineFactory: Send + Sync {
    fn build(&self, config: Value) -> Result<Box<dyn RenderEngine>, RenderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uri_without_query() {
        assert_eq!(RenderRequest::get("/service", "").uri(), "/service");
        assert_eq!(RenderRequest::get("/service", "a=1").uri(), "/service?a=1");
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let response = RenderResponse::single_chunk(
            200,
            vec![("Content-Type".to_string(), "image/png".to_string())],
            Bytes::from_static(b"png"),
        );
        assert_eq!(response.content_type(), Some("image/png"));
        assert!(response.is_success());
    }

    #[tokio::test]
    async fn test_single_chunk_yields_once() {
        let mut response = RenderResponse::single_chunk(200, Vec::new(), "abc");
        let chunk = response.next_chunk().await.unwrap().unwrap();
        assert_eq!(chunk.as_ref(), b"abc");
        assert!(response.next_chunk().await.is_none());
    }
}
