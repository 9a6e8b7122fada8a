//! Collection paging.
//!
//! A collection response is a [`Page`]: a `value` array plus an optional
//! `@odata.nextLink` pointing at the next page. [`Paginator`] follows the
//! links until a page carries none and returns every item in page order.
//! A failure on any page aborts the traversal and discards what was
//! collected so far.

use crate::client::{GraphClient, Payload};
use crate::endpoint::Endpoint;
use crate::error::{GraphError, GraphResult};
use log::{debug, error};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const NEXT_LINK: &str = "@odata.nextLink";
pub const DELTA_LINK: &str = "@odata.deltaLink";

/// One decoded collection response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub value: Vec<Value>,
    #[serde(rename = "@odata.nextLink", default, skip_serializing_if = "Option::is_none")]
    pub next_link: Option<String>,
    #[serde(rename = "@odata.deltaLink", default, skip_serializing_if = "Option::is_none")]
    pub delta_link: Option<String>,
}

impl Page {
    /// Interpret a dispatcher payload as a page. An empty body is an empty
    /// terminal page; a binary body is not a page at all.
    pub fn from_payload(payload: Payload) -> GraphResult<Self> {
        match payload {
            Payload::Json(Value::Null) => Ok(Self::default()),
            Payload::Json(value) => Ok(serde_json::from_value(value)?),
            Payload::Bytes(b) => Err(GraphError::serialization(format!(
                "Expected a collection page, got {} bytes of non-JSON content",
                b.len()
            ))),
        }
    }

    /// No further page follows.
    pub fn is_last(&self) -> bool {
        self.next_link.is_none()
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Paginator
// ═══════════════════════════════════════════════════════════════════════

/// Follows `@odata.nextLink` over one collection.
#[derive(Debug, Clone, Copy)]
pub struct Paginator<'a> {
    client: &'a GraphClient,
    max_pages: Option<usize>,
}

impl<'a> Paginator<'a> {
    pub fn new(client: &'a GraphClient) -> Self {
        Self {
            client,
            max_pages: None,
        }
    }

    /// Fail instead of fetching more than `pages` pages.
    pub fn max_pages(mut self, pages: usize) -> Self {
        self.max_pages = Some(pages);
        self
    }

    /// Every item of the collection as raw JSON.
    pub async fn fetch_all(&self, endpoint: &Endpoint) -> GraphResult<Vec<Value>> {
        self.fetch_all_with(endpoint, Ok).await
    }

    /// Every item of the collection decoded into `T`.
    pub async fn fetch_all_as<T: DeserializeOwned>(
        &self,
        endpoint: &Endpoint,
    ) -> GraphResult<Vec<T>> {
        self.fetch_all_with(endpoint, |v| Ok(serde_json::from_value(v)?))
            .await
    }

    /// Every item of the collection passed through `decode`. A decoder error
    /// aborts the traversal like a failed page would.
    pub async fn fetch_all_with<T, F>(&self, endpoint: &Endpoint, decode: F) -> GraphResult<Vec<T>>
    where
        F: FnMut(Value) -> GraphResult<T>,
    {
        let (items, _) = collect(self.client, endpoint, self.max_pages, decode).await?;
        Ok(items)
    }
}

/// Walk a `nextLink` chain starting at `first`, returning the decoded items
/// and the terminal page (with its `value` already drained).
pub(crate) async fn collect<T, F>(
    client: &GraphClient,
    first: &Endpoint,
    max_pages: Option<usize>,
    mut decode: F,
) -> GraphResult<(Vec<T>, Page)>
where
    F: FnMut(Value) -> GraphResult<T>,
{
    let mut items = Vec::new();
    let mut current = first.clone();
    let mut pages = 0usize;

    loop {
        let mut page = Page::from_payload(client.request(&current).await?).map_err(|e| {
            error!("Page {} of {} is not a collection: {}", pages + 1, first.path(), e);
            e
        })?;
        pages += 1;
        debug!(
            "Page {} of {}: {} item(s), more={}",
            pages,
            first.path(),
            page.value.len(),
            !page.is_last()
        );

        for value in page.value.drain(..) {
            let item = decode(value).map_err(|e| {
                error!("Item of {} could not be decoded: {}", first.path(), e);
                e
            })?;
            items.push(item);
        }

        let next = match page.next_link.take() {
            Some(link) => link,
            None => return Ok((items, page)),
        };

        if next == current.path() {
            let err = GraphError::invalid_request(format!(
                "Continuation link did not advance: {}",
                next
            ));
            error!("{}", err);
            return Err(err);
        }
        if let Some(limit) = max_pages {
            if pages >= limit {
                let err = GraphError::invalid_request(format!(
                    "Collection {} exceeded {} page(s)",
                    first.path(),
                    limit
                ));
                error!("{}", err);
                return Err(err);
            }
        }

        current = Endpoint::link(next);
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
