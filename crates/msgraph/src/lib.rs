//! # msgraph — Microsoft Graph client core
//!
//! The authenticated-request layer every Graph resource accessor is built
//! on. Resource-specific mappers (users, groups, calendars, files, sites)
//! live outside this crate and only consume the contract defined here.
//!
//! ## Capabilities
//!
//! - **Certificate authentication** – OAuth2 client-credentials grant with an
//!   RS256 client assertion, plus construction from a pre-obtained token.
//! - **Request dispatch** – versioned URL resolution, bearer and content
//!   headers, JSON-or-bytes decoding, in-band error detection.
//! - **Token lifetime** – explicit validity predicate consulted before each
//!   call, with an optional injected refresher.
//! - **Pagination** – `@odata.nextLink` traversal written once, generic over
//!   an item decoder, all-or-nothing.
//! - **Delta sync** – resumable `@odata.deltaLink` cursors.
//! - **Scope selector** – `me` / user / group / site / drive path prefixes.

pub mod auth;
pub mod client;
pub mod config;
pub mod datetime;
pub mod delta;
pub mod endpoint;
pub mod error;
pub mod pagination;
pub mod scope;
pub mod token;
pub mod transport;

pub use auth::{authenticate, ClientCertificate, TokenProvider, TokenRefresher};
pub use client::{GraphClient, Payload};
pub use config::{ApiVersion, GraphConfig};
pub use delta::{DeltaCursor, DeltaPage, DeltaSeed, DeltaSync, REMOVED_MARKER};
pub use endpoint::{Endpoint, RequestBody};
pub use error::{GraphError, GraphErrorKind, GraphResult};
pub use pagination::{Page, Paginator};
pub use scope::Scope;
pub use token::Token;
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
