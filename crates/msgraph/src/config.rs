//! Connection configuration: identity authority, tenant, resource audience,
//! API version and HTTP timeouts.

use crate::error::{GraphError, GraphResult};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
pub const DEFAULT_RESOURCE_URI: &str = "https://graph.microsoft.com";

// ═══════════════════════════════════════════════════════════════════════
//  API version
// ═══════════════════════════════════════════════════════════════════════

/// Versioned path segment inserted between the resource URI and the
/// request path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ApiVersion {
    /// `v1.0`
    V1,
    /// `beta`
    Beta,
    /// Any other segment, used verbatim.
    Custom(String),
}

impl ApiVersion {
    /// The path segment, e.g. `v1.0`.
    pub fn as_segment(&self) -> &str {
        match self {
            ApiVersion::V1 => "v1.0",
            ApiVersion::Beta => "beta",
            ApiVersion::Custom(s) => s.as_str(),
        }
    }
}

impl Default for ApiVersion {
    fn default() -> Self {
        ApiVersion::V1
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_segment())
    }
}

impl From<&str> for ApiVersion {
    fn from(s: &str) -> Self {
        match s.trim().trim_matches('/') {
            "1.0" | "v1.0" => ApiVersion::V1,
            "beta" | "vbeta" => ApiVersion::Beta,
            other => ApiVersion::Custom(other.to_string()),
        }
    }
}

impl From<String> for ApiVersion {
    fn from(s: String) -> Self {
        ApiVersion::from(s.as_str())
    }
}

impl From<ApiVersion> for String {
    fn from(v: ApiVersion) -> Self {
        v.as_segment().to_string()
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  GraphConfig
// ═══════════════════════════════════════════════════════════════════════

/// Configuration for a Graph connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Identity authority. Default: `https://login.microsoftonline.com`.
    pub authority_host: String,
    /// Entra ID tenant (GUID or domain).
    pub tenant: String,
    /// Resource audience and API host. Default: `https://graph.microsoft.com`.
    pub resource_uri: String,
    /// Application (client) ID.
    pub client_id: String,
    /// Version used for relative paths that do not pick their own.
    pub api_version: ApiVersion,
    /// Timeout in seconds for HTTP calls. Default: 60.
    pub timeout_sec: u64,
    /// Seconds before `expires_on` at which an installed refresher is asked
    /// for a new token. Default: 60.
    pub refresh_margin_sec: i64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            authority_host: DEFAULT_AUTHORITY_HOST.into(),
            tenant: "common".into(),
            resource_uri: DEFAULT_RESOURCE_URI.into(),
            client_id: String::new(),
            api_version: ApiVersion::V1,
            timeout_sec: 60,
            refresh_margin_sec: 60,
        }
    }
}

impl GraphConfig {
    pub fn new(tenant: &str, client_id: &str) -> Self {
        Self {
            tenant: tenant.to_string(),
            client_id: client_id.to_string(),
            ..Default::default()
        }
    }

    pub fn with_authority_host(mut self, host: &str) -> Self {
        self.authority_host = host.to_string();
        self
    }

    pub fn with_resource_uri(mut self, uri: &str) -> Self {
        self.resource_uri = uri.to_string();
        self
    }

    pub fn with_api_version(mut self, version: impl Into<ApiVersion>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn with_timeout_sec(mut self, secs: u64) -> Self {
        self.timeout_sec = secs;
        self
    }

    pub fn with_refresh_margin_sec(mut self, secs: i64) -> Self {
        self.refresh_margin_sec = secs;
        self
    }

    /// Resolve configuration from `MSGRAPH_*` environment variables.
    ///
    /// `MSGRAPH_TENANT` and `MSGRAPH_CLIENT_ID` are required; the authority
    /// host, resource URI, API version and timeout fall back to defaults.
    pub fn from_environment() -> Option<Self> {
        let tenant = std::env::var("MSGRAPH_TENANT").ok()?;
        let client_id = std::env::var("MSGRAPH_CLIENT_ID").ok()?;
        let mut config = Self::new(&tenant, &client_id);
        if let Ok(host) = std::env::var("MSGRAPH_AUTHORITY_HOST") {
            config.authority_host = host;
        }
        if let Ok(uri) = std::env::var("MSGRAPH_RESOURCE_URI") {
            config.resource_uri = uri;
        }
        if let Ok(version) = std::env::var("MSGRAPH_API_VERSION") {
            config.api_version = ApiVersion::from(version);
        }
        if let Some(timeout) = std::env::var("MSGRAPH_TIMEOUT_SEC")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.timeout_sec = timeout;
        }
        Some(config)
    }

    /// `{authority_host}/{tenant}`.
    pub fn authority_uri(&self) -> String {
        format!(
            "{}/{}",
            self.authority_host.trim_end_matches('/'),
            self.tenant.trim_matches('/')
        )
    }

    /// Client-credentials token endpoint for the tenant.
    pub fn token_endpoint(&self) -> String {
        format!("{}/oauth2/token", self.authority_uri())
    }

    /// Check the fields needed for certificate authentication.
    pub fn validate(&self) -> GraphResult<()> {
        if self.tenant.trim().is_empty() {
            return Err(GraphError::configuration("tenant is required"));
        }
        if self.client_id.trim().is_empty() {
            return Err(GraphError::configuration("client_id is required"));
        }
        for (name, value) in [
            ("authority_host", &self.authority_host),
            ("resource_uri", &self.resource_uri),
        ] {
            let parsed = url::Url::parse(value).map_err(|e| {
                GraphError::configuration(format!("{} is not a valid URL: {}", name, e))
            })?;
            if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
                return Err(GraphError::configuration(format!(
                    "{} must be an absolute http(s) URL: {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
