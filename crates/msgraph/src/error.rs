//! Error types for the Microsoft Graph client core.
//!
//! Every fallible operation in this crate returns `GraphResult<T>`. Errors are
//! built once where the failure is detected and handed to the caller
//! unchanged; nothing in the core retries or swallows them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Convenience alias.
pub type GraphResult<T> = Result<T, GraphError>;

/// Broad failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraphErrorKind {
    /// The identity provider rejected the credential exchange, or the
    /// certificate material could not be used.
    Authentication,
    /// The held token is past `expires_on` and no refresher is installed.
    TokenExpired,
    /// Connection refused, timeout, DNS or TLS failure. No structured
    /// response was received.
    Transport,
    /// The API reported `{ "error": { "code", "message" } }`, in-band or not.
    Api,
    /// (De)serialization error.
    Serialization,
    /// The request could not be built (bad URL, foreign host, runaway
    /// pagination).
    InvalidRequest,
    /// A delta traversal ended without an `@odata.deltaLink`.
    MissingDeltaLink,
    /// Missing or malformed configuration.
    Configuration,
}

impl fmt::Display for GraphErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Structured error returned by every public function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphError {
    pub kind: GraphErrorKind,
    /// API-defined code (`Request_ResourceNotFound`, `invalid_client`, ...)
    /// or a transport-level code (`timeout`, `connect`, ...).
    pub code: Option<String>,
    pub message: String,
    pub status: Option<u16>,
    pub request_id: Option<String>,
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)?;
        if let Some(ref code) = self.code {
            write!(f, " (code: {})", code)?;
        }
        if let Some(status) = self.status {
            write!(f, " (HTTP {})", status)?;
        }
        Ok(())
    }
}

impl std::error::Error for GraphError {}

impl GraphError {
    /// Create from a kind + message.
    pub fn new(kind: GraphErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            code: None,
            message: msg.into(),
            status: None,
            request_id: None,
        }
    }

    /// Attach a code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Attach an HTTP status.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Attach a request id when one is known and none was parsed already.
    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        if self.request_id.is_none() {
            self.request_id = request_id;
        }
        self
    }

    /// Re-tag the error as an authentication failure, keeping code and
    /// message. Used to wrap transport and provider errors raised while
    /// acquiring a token.
    pub fn into_authentication(mut self) -> Self {
        self.kind = GraphErrorKind::Authentication;
        self
    }

    /// Shortcut: authentication failure with a provider or local code.
    pub fn authentication(code: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::new(GraphErrorKind::Authentication, msg).with_code(code)
    }

    /// Shortcut: transport failure.
    pub fn transport(code: Option<&str>, msg: impl Into<String>) -> Self {
        let mut err = Self::new(GraphErrorKind::Transport, msg);
        err.code = code.map(String::from);
        err
    }

    /// Shortcut: structured API failure.
    pub fn api(code: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::new(GraphErrorKind::Api, msg).with_code(code)
    }

    /// Shortcut: token past its expiry.
    pub fn token_expired(msg: impl Into<String>) -> Self {
        Self::new(GraphErrorKind::TokenExpired, msg).with_code("token_expired")
    }

    /// Shortcut: invalid request.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::new(GraphErrorKind::InvalidRequest, msg)
    }

    /// Shortcut: configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::new(GraphErrorKind::Configuration, msg)
    }

    /// Shortcut: serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::new(GraphErrorKind::Serialization, msg)
    }

    /// Whether the API asked the caller to slow down. The core never acts on
    /// this; it is exposed so a higher layer can implement back-off.
    pub fn is_throttled(&self) -> bool {
        self.status == Some(429)
            || matches!(
                self.code.as_deref(),
                Some("TooManyRequests") | Some("activityLimitReached") | Some("throttledRequest")
            )
    }

    /// Extract an error from a decoded response body.
    ///
    /// Recognises the Graph envelope
    /// `{ "error": { "code": "...", "message": "...", "innerError": { "request-id": "..." } } }`
    /// and the identity-provider shape
    /// `{ "error": "invalid_client", "error_description": "..." }`.
    /// Returns `None` when the body carries no `error` member.
    pub fn from_error_body(status: Option<u16>, body: &Value) -> Option<Self> {
        let err = body.get("error")?;
        let mut parsed = match err {
            Value::Object(_) => {
                let code = err["code"].as_str().unwrap_or("unknown");
                let message = err["message"].as_str().unwrap_or("Graph API error");
                let request_id = ["innerError", "innererror"]
                    .iter()
                    .find_map(|key| err[*key]["request-id"].as_str())
                    .map(String::from);
                let mut e = Self::api(code, message);
                e.request_id = request_id;
                e
            }
            Value::String(code) => {
                let message = body["error_description"]
                    .as_str()
                    .unwrap_or(code.as_str());
                Self::api(code.as_str(), message)
            }
            _ => return None,
        };
        parsed.status = status;
        Some(parsed)
    }
}

impl From<reqwest::Error> for GraphError {
    fn from(err: reqwest::Error) -> Self {
        let code = if err.is_timeout() {
            Some("timeout")
        } else if err.is_connect() {
            Some("connect")
        } else if err.is_body() || err.is_decode() {
            Some("body")
        } else if err.is_request() {
            Some("request")
        } else {
            None
        };
        let mut e = Self::transport(code, format!("HTTP transport error: {}", err));
        e.status = err.status().map(|s| s.as_u16());
        e
    }
}

impl From<serde_json::Error> for GraphError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}

impl From<url::ParseError> for GraphError {
    fn from(err: url::ParseError) -> Self {
        Self::invalid_request(format!("URL parse error: {}", err))
    }
}

impl From<jsonwebtoken::errors::Error> for GraphError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::authentication(
            "invalid_certificate",
            format!("Failed to sign client assertion: {}", err),
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
