//! Request dispatcher for the Graph API.
//!
//! [`GraphClient`] resolves an [`Endpoint`] to an absolute URL, attaches the
//! bearer token and content headers, performs exactly one HTTP exchange and
//! classifies the outcome:
//!
//! 1. transport failure → `GraphErrorKind::Transport`
//! 2. decoded JSON carrying an `error` member → `GraphErrorKind::Api`,
//!    whatever the status
//! 3. otherwise the decoded JSON, or the raw bytes when the body is not JSON
//!
//! The status of a response without an `error` member does not change the
//! outcome; it is only logged.
//!
//! No retry or back-off happens here.

use crate::auth::{ClientCertificate, TokenProvider, TokenRefresher};
use crate::config::GraphConfig;
use crate::endpoint::{Endpoint, RequestBody};
use crate::error::{GraphError, GraphResult};
use crate::token::Token;
use crate::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
use chrono::{Duration, Utc};
use log::{debug, error, info, warn};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Successful response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// The body parsed as JSON. An empty body is `Json(Value::Null)`.
    Json(Value),
    /// The body was not JSON (file content and other binary downloads).
    Bytes(Vec<u8>),
}

impl Payload {
    pub fn is_json(&self) -> bool {
        matches!(self, Payload::Json(_))
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Json(v) => Some(v),
            Payload::Bytes(_) => None,
        }
    }

    pub fn into_json(self) -> GraphResult<Value> {
        match self {
            Payload::Json(v) => Ok(v),
            Payload::Bytes(b) => Err(GraphError::serialization(format!(
                "Expected a JSON body, got {} bytes of non-JSON content",
                b.len()
            ))),
        }
    }

    /// The body as bytes; a JSON payload is re-serialised.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Payload::Json(Value::Null) => Vec::new(),
            Payload::Json(v) => v.to_string().into_bytes(),
            Payload::Bytes(b) => b,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  GraphClient
// ═══════════════════════════════════════════════════════════════════════

/// Authenticated dispatcher. `Send + Sync`; share it behind an `Arc`.
pub struct GraphClient {
    config: GraphConfig,
    transport: Arc<dyn Transport>,
    token: RwLock<Token>,
    refresher: Option<Arc<dyn TokenRefresher>>,
}

impl fmt::Debug for GraphClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphClient")
            .field("config", &self.config)
            .field("refresher", &self.refresher.is_some())
            .finish()
    }
}

impl GraphClient {
    /// Client over the default `reqwest` transport.
    pub fn new(config: GraphConfig, token: Token) -> GraphResult<Self> {
        let transport =
            ReqwestTransport::new(std::time::Duration::from_secs(config.timeout_sec))?;
        Ok(Self::with_transport(config, token, Arc::new(transport)))
    }

    pub fn with_transport(config: GraphConfig, token: Token, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            token: RwLock::new(token),
            refresher: None,
        }
    }

    /// Install a refresher consulted before dispatch when the token is about
    /// to expire.
    pub fn with_refresher(mut self, refresher: Arc<dyn TokenRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    /// Authenticate with a client certificate and keep the provider installed
    /// as the refresher.
    pub async fn from_certificate(
        config: GraphConfig,
        certificate: ClientCertificate,
    ) -> GraphResult<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_sec))
            .build()
            .map_err(|e| {
                GraphError::configuration(format!("Failed to create HTTP client: {}", e))
            })?;
        let provider = Arc::new(
            TokenProvider::from_config(&config, certificate).with_http_client(http.clone()),
        );
        let token = provider.authenticate().await?;
        let transport = Arc::new(ReqwestTransport::from_client(http));
        Ok(Self::with_transport(config, token, transport).with_refresher(provider))
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Snapshot of the token currently held.
    pub async fn token(&self) -> Token {
        self.token.read().await.clone()
    }

    /// Replace the held token (e.g. one obtained by an external flow).
    pub async fn set_token(&self, token: Token) {
        *self.token.write().await = token;
    }

    pub fn resolve_url(&self, endpoint: &Endpoint) -> GraphResult<String> {
        endpoint.resolve_url(&self.config.resource_uri, &self.config.api_version)
    }

    /// Token to use for the next dispatch.
    ///
    /// With a refresher installed, a token inside the refresh margin is
    /// replaced first. Without one, an expired token fails the call before
    /// anything is sent.
    async fn current_token(&self) -> GraphResult<Token> {
        let token = self.token.read().await.clone();

        let refresher = match &self.refresher {
            Some(r) => r,
            None => {
                if token.is_valid_at(Utc::now()) {
                    return Ok(token);
                }
                let err = GraphError::token_expired(format!(
                    "Access token expired at {:?} and no refresher is installed",
                    token.expires_on
                ));
                error!("{}", err);
                return Err(err);
            }
        };

        if !self.needs_refresh(&token) {
            return Ok(token);
        }

        let mut guard = self.token.write().await;
        // Another task may have refreshed while we waited for the lock.
        if !self.needs_refresh(&guard) {
            return Ok(guard.clone());
        }
        warn!(
            "Access token expires at {:?}; refreshing before dispatch",
            guard.expires_on
        );
        let fresh = refresher.refresh().await?;
        *guard = fresh.clone();
        Ok(fresh)
    }

    /// Whether `token` is inside the refresh margin. A margin too large to
    /// represent covers every token that has an expiry.
    fn needs_refresh(&self, token: &Token) -> bool {
        match Duration::try_seconds(self.config.refresh_margin_sec.max(0)) {
            Some(margin) => token.expires_within(margin, Utc::now()),
            None => token.expires_on.is_some(),
        }
    }

    // ── Dispatch ─────────────────────────────────────────────────────

    /// Execute one endpoint and classify the response.
    pub async fn request(&self, endpoint: &Endpoint) -> GraphResult<Payload> {
        let url = self.resolve_url(endpoint).map_err(|e| {
            error!("{} {} rejected: {}", endpoint.method(), endpoint.path(), e);
            e
        })?;
        let token = self.current_token().await?;

        let mut headers = vec![
            ("Authorization".to_string(), token.authorization_header()),
            (
                "Content-Type".to_string(),
                endpoint.content_type_or_default().to_string(),
            ),
        ];
        for (name, value) in endpoint.headers() {
            headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
            headers.push((name.clone(), value.clone()));
        }

        let body = match endpoint.body() {
            RequestBody::Empty => None,
            RequestBody::Json(v) => Some(serde_json::to_vec(v).map_err(|e| {
                let err = GraphError::from(e);
                error!("{} {} body not encodable: {}", endpoint.method(), endpoint.path(), err);
                err
            })?),
            RequestBody::Raw(bytes) => Some(bytes.clone()),
        };

        let request = HttpRequest {
            method: endpoint.method().clone(),
            url,
            headers,
            query: endpoint
                .query_params()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            body,
        };

        info!("{} {}", request.method, request.url);
        let method = request.method.clone();
        let url = request.url.clone();

        let response = self.transport.send(request).await.map_err(|e| {
            error!("{} {} failed: {}", method, url, e);
            e
        })?;

        classify(response).map_err(|e| {
            error!("{} {} failed: {}", method, url, e);
            e
        })
    }

    /// GET a relative path and return its JSON body.
    pub async fn get_json(&self, path: &str) -> GraphResult<Value> {
        self.request(&Endpoint::get(path)).await?.into_json()
    }

    /// Execute an endpoint and decode its JSON body into `T`.
    pub async fn request_as<T: DeserializeOwned>(&self, endpoint: &Endpoint) -> GraphResult<T> {
        let value = self.request(endpoint).await?.into_json()?;
        Ok(serde_json::from_value(value)?)
    }
}

fn classify(response: HttpResponse) -> GraphResult<Payload> {
    let status = response.status;
    let success = response.is_success();
    let request_id = response
        .header("request-id")
        .or_else(|| response.header("client-request-id"))
        .map(String::from);

    let payload = if response.body.is_empty() {
        Payload::Json(Value::Null)
    } else {
        match serde_json::from_slice::<Value>(&response.body) {
            Ok(value) => {
                if let Some(err) = GraphError::from_error_body(Some(status), &value) {
                    return Err(err.with_request_id(request_id));
                }
                debug!("Decoded JSON body ({} bytes)", response.body.len());
                Payload::Json(value)
            }
            Err(_) => {
                debug!("Non-JSON body passed through ({} bytes)", response.body.len());
                Payload::Bytes(response.body)
            }
        }
    };

    if !success {
        warn!("HTTP {} without an error body; returning it as data", status);
    }
    Ok(payload)
}

// ═══════════════════════════════════════════════════════════════════════
//  Test support
// ═══════════════════════════════════════════════════════════════════════


// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
