//! Logical request descriptor and URL resolution.
//!
//! An [`Endpoint`] names a Graph path plus query, body, method and headers.
//! It is resolved against the configured resource URI only at dispatch time:
//! relative paths become `{resource}/{version}/{path}`, while absolute links
//! on the resource host (continuation and delta links handed back by the
//! API) are replayed verbatim.

use crate::config::ApiVersion;
use crate::error::{GraphError, GraphResult};
use reqwest::Method;
use serde_json::Value;
use std::collections::BTreeMap;

pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Request payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Raw(Vec<u8>),
}

/// One logical request against the API.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    method: Method,
    path: String,
    version: Option<ApiVersion>,
    query: BTreeMap<String, String>,
    body: RequestBody,
    headers: Vec<(String, String)>,
    content_type: Option<String>,
}

impl Endpoint {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            version: None,
            query: BTreeMap::new(),
            body: RequestBody::Empty,
            headers: Vec::new(),
            content_type: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// GET against an absolute link returned by the API (`@odata.nextLink`,
    /// `@odata.deltaLink`). The link already carries version, host and
    /// query, so nothing is added to it.
    pub fn link(url: impl Into<String>) -> Self {
        Self::get(url)
    }

    // ── Builders ─────────────────────────────────────────────────────

    /// Override the client's default API version for this request.
    pub fn version(mut self, version: impl Into<ApiVersion>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.insert(key.into(), value.to_string());
        self
    }

    /// `$top` page-size hint. Only meaningful on the first request of a
    /// collection; continuation links carry the effective size themselves.
    pub fn top(self, page_size: u32) -> Self {
        self.query("$top", page_size)
    }

    /// `$select` field projection. An empty list leaves the query untouched.
    pub fn select(self, fields: &[&str]) -> Self {
        if fields.is_empty() {
            return self;
        }
        self.query("$select", fields.join(","))
    }

    /// `$filter`, joining the clauses with ` and `.
    pub fn filter<I, S>(self, clauses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = clauses
            .into_iter()
            .map(|c| c.as_ref().trim().to_string())
            .filter(|c| !c.is_empty())
            .collect::<Vec<_>>()
            .join(" and ");
        if joined.is_empty() {
            return self;
        }
        self.query("$filter", joined)
    }

    /// `$search`, passed through as given.
    pub fn search(self, expression: &str) -> Self {
        self.query("$search", expression)
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn raw(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.body = RequestBody::Raw(bytes.into());
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Extra header; overrides the default `Authorization` / `Content-Type`
    /// when the names collide.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_params(&self) -> &BTreeMap<String, String> {
        &self.query
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn content_type_or_default(&self) -> &str {
        self.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE)
    }

    pub fn is_absolute(&self) -> bool {
        is_absolute_url(&self.path)
    }

    /// Resolve to an absolute URL.
    ///
    /// A path that is already an absolute URL on the resource host is
    /// returned unchanged. Absolute URLs on any other host are refused so the
    /// bearer token is never sent off-resource.
    pub fn resolve_url(
        &self,
        resource_uri: &str,
        default_version: &ApiVersion,
    ) -> GraphResult<String> {
        let resource = resource_uri.trim_end_matches('/');

        if self.is_absolute() {
            let target = url::Url::parse(&self.path)?;
            let base = url::Url::parse(resource)?;
            let same_origin = target.scheme() == base.scheme()
                && target.host_str() == base.host_str()
                && target.port_or_known_default() == base.port_or_known_default();
            if same_origin {
                return Ok(self.path.clone());
            }
            return Err(GraphError::invalid_request(format!(
                "Refusing to send credentials to {} (configured resource is {})",
                target.host_str().unwrap_or("<no host>"),
                resource
            )));
        }

        let version = self.version.as_ref().unwrap_or(default_version);
        Ok(format!(
            "{}/{}/{}",
            resource,
            version.as_segment(),
            self.path.trim_start_matches('/')
        ))
    }
}

fn is_absolute_url(path: &str) -> bool {
    let lower = path.get(..8).unwrap_or(path).to_ascii_lowercase();
    lower.starts_with("https://") || lower.starts_with("http://")
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
