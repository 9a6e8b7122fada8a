//! Incremental sync over delta-capable collections.
//!
//! The first call runs against `{collection}/delta` (with a `$select`
//! projection); every later call replays the cursor returned by the previous
//! one. Pages are followed exactly as in [`crate::pagination`], and the
//! terminal page must carry `@odata.deltaLink`, which becomes the next
//! cursor. A traversal that fails midway yields no cursor at all.

use crate::client::GraphClient;
use crate::endpoint::Endpoint;
use crate::error::{GraphError, GraphErrorKind, GraphResult};
use crate::pagination::collect;
use log::{error, info};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Member set on items deleted since the previous sync. Passed through
/// untouched for the resource mapper to interpret.
pub const REMOVED_MARKER: &str = "@removed";

/// Opaque resumption point (an absolute `@odata.deltaLink` URL). Persist it
/// and hand it back verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeltaCursor(String);

impl DeltaCursor {
    pub fn new(link: impl Into<String>) -> Self {
        Self(link.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for DeltaCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a delta traversal starts.
#[derive(Debug, Clone, PartialEq)]
pub enum DeltaSeed {
    /// First-ever sync against a delta-capable endpoint.
    Endpoint(Endpoint),
    /// Resume from a cursor returned by an earlier sync.
    Cursor(DeltaCursor),
}

impl DeltaSeed {
    /// `{collection}/delta` with the given `$select` projection.
    pub fn collection(path: &str, fields: &[&str]) -> Self {
        let path = format!("{}/delta", path.trim_end_matches('/'));
        DeltaSeed::Endpoint(Endpoint::get(path).select(fields))
    }

    pub fn endpoint(&self) -> Endpoint {
        match self {
            DeltaSeed::Endpoint(e) => e.clone(),
            DeltaSeed::Cursor(c) => Endpoint::link(c.as_str()),
        }
    }
}

impl From<Endpoint> for DeltaSeed {
    fn from(endpoint: Endpoint) -> Self {
        DeltaSeed::Endpoint(endpoint)
    }
}

impl From<DeltaCursor> for DeltaSeed {
    fn from(cursor: DeltaCursor) -> Self {
        DeltaSeed::Cursor(cursor)
    }
}

/// Items changed since the seed, plus the cursor for the next sync.
#[derive(Debug, Clone, PartialEq)]
pub struct DeltaPage<T> {
    pub items: Vec<T>,
    pub cursor: DeltaCursor,
}

// ═══════════════════════════════════════════════════════════════════════
//  DeltaSync
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy)]
pub struct DeltaSync<'a> {
    client: &'a GraphClient,
    max_pages: Option<usize>,
}

impl<'a> DeltaSync<'a> {
    pub fn new(client: &'a GraphClient) -> Self {
        Self {
            client,
            max_pages: None,
        }
    }

    pub fn max_pages(mut self, pages: usize) -> Self {
        self.max_pages = Some(pages);
        self
    }

    pub async fn fetch_delta(&self, seed: impl Into<DeltaSeed>) -> GraphResult<DeltaPage<Value>> {
        self.fetch_delta_with(seed, Ok).await
    }

    pub async fn fetch_delta_as<T: DeserializeOwned>(
        &self,
        seed: impl Into<DeltaSeed>,
    ) -> GraphResult<DeltaPage<T>> {
        self.fetch_delta_with(seed, |v| Ok(serde_json::from_value(v)?))
            .await
    }

    pub async fn fetch_delta_with<T, F>(
        &self,
        seed: impl Into<DeltaSeed>,
        decode: F,
    ) -> GraphResult<DeltaPage<T>>
    where
        F: FnMut(Value) -> GraphResult<T>,
    {
        let seed = seed.into();
        let first = seed.endpoint();
        let (items, last) = collect(self.client, &first, self.max_pages, decode).await?;

        let cursor = match last.delta_link {
            Some(link) => DeltaCursor::new(link),
            None => {
                let err = GraphError::new(
                    GraphErrorKind::MissingDeltaLink,
                    format!("Delta traversal of {} ended without a deltaLink", first.path()),
                );
                error!("{}", err);
                return Err(err);
            }
        };

        info!(
            "Delta sync of {} returned {} change(s)",
            first.path(),
            items.len()
        );
        Ok(DeltaPage { items, cursor })
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
