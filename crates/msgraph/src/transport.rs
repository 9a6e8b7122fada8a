//! HTTP transport seam.
//!
//! `GraphClient` talks to the network only through [`Transport`]. The
//! default implementation wraps a `reqwest::Client`, whose connection pool
//! is safe to share across tasks, so one transport may back several
//! concurrently running clients.

use crate::error::{GraphError, GraphResult};
use async_trait::async_trait;
use log::debug;
use reqwest::Method;
use std::time::Duration;

/// A fully resolved request, ready to send.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// Raw response as received.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Sends one request and returns the raw response.
///
/// Implementations report connection, DNS, TLS and timeout failures as
/// `GraphErrorKind::Transport`; any response that was actually received,
/// whatever its status, is returned as `Ok`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> GraphResult<HttpResponse>;
}

/// Default transport over `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> GraphResult<Self> {
        let inner = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                GraphError::configuration(format!("Failed to create HTTP client: {}", e))
            })?;
        Ok(Self { inner })
    }

    /// Reuse an existing client (and its connection pool).
    pub fn from_client(inner: reqwest::Client) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> GraphResult<HttpResponse> {
        let mut builder = self.inner.request(request.method, &request.url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let resp = builder.send().await.map_err(GraphError::from)?;
        let status = resp.status().as_u16();
        let headers = resp
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();
        let body = resp.bytes().await.map_err(GraphError::from)?.to_vec();

        debug!("Response status={} body_len={}", status, body.len());
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Test support
// ═══════════════════════════════════════════════════════════════════════

/// Scripted in-memory transport shared by the unit tests.
#[cfg(test)]
pub(crate) mod scripted {
    use super::*;
    use serde_json::Value;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Default)]
    pub(crate) struct ScriptedTransport {
        responses: Mutex<VecDeque<GraphResult<HttpResponse>>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn push(&self, response: GraphResult<HttpResponse>) -> &Self {
            self.responses.lock().unwrap().push_back(response);
            self
        }

        pub(crate) fn push_json(&self, status: u16, body: Value) -> &Self {
            self.push(Ok(HttpResponse::new(status, body.to_string())))
        }

        pub(crate) fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub(crate) fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: HttpRequest) -> GraphResult<HttpResponse> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(GraphError::transport(None, "script exhausted")))
        }
    }
}
