//! Scope selector: which principal or container an operation targets.
//!
//! Resource accessors resolve a [`Scope`] once into a path prefix instead of
//! re-checking optional user / group / site / drive arguments in every
//! method.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Characters escaped when an identifier is placed into a single path
/// segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum Scope {
    /// The signed-in principal (`/me`).
    Me,
    User(String),
    Group(String),
    Site(String),
    Drive(String),
}

impl Scope {
    /// Path of the scope itself: `me`, `users/{id}`, `groups/{id}`,
    /// `sites/{id}`, `drives/{id}`.
    pub fn prefix(&self) -> String {
        match self {
            Scope::Me => "me".to_string(),
            Scope::User(id) => format!("users/{}", encode(id)),
            Scope::Group(id) => format!("groups/{}", encode(id)),
            Scope::Site(id) => format!("sites/{}", encode(id)),
            Scope::Drive(id) => format!("drives/{}", encode(id)),
        }
    }

    /// Path of the default drive for the scope. A `Drive` scope is its own
    /// drive.
    pub fn drive_path(&self) -> String {
        match self {
            Scope::Drive(_) => self.prefix(),
            _ => format!("{}/drive", self.prefix()),
        }
    }

    /// Path that enumerates the drives available to the scope.
    pub fn drives_path(&self) -> String {
        match self {
            Scope::Drive(_) => self.prefix(),
            _ => format!("{}/drives", self.prefix()),
        }
    }

    /// `{drive}/items/{item_id}` under the scope's drive.
    pub fn drive_item_path(&self, item_id: &str) -> String {
        format!("{}/items/{}", self.drive_path(), encode(item_id))
    }
}

impl Default for Scope {
    fn default() -> Self {
        Scope::Me
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.prefix())
    }
}

fn encode(id: &str) -> String {
    utf8_percent_encode(id, SEGMENT).to_string()
}
