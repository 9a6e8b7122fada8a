//! Bearer credential value.
//!
//! A `Token` is never mutated after construction; a refresh yields a new
//! value that replaces the old one wholesale.

use crate::datetime::parse_graph_datetime;
use crate::error::{GraphError, GraphResult};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Access token issued for one resource audience.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    /// Authorization scheme, normally `Bearer`.
    pub token_type: String,
    /// Audience the token is valid for, when known.
    pub resource: Option<String>,
    /// Absolute expiry. `None` means the caller manages the lifetime.
    pub expires_on: Option<DateTime<Utc>>,
    /// Lifetime in seconds as reported by the provider. Informational.
    pub expires_in: Option<i64>,
}

impl Token {
    /// Wrap an access token obtained elsewhere. No network effect; the token
    /// carries no expiry and is never considered expired.
    pub fn from_access_token(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: "Bearer".into(),
            resource: None,
            expires_on: None,
            expires_in: None,
        }
    }

    pub fn with_token_type(mut self, token_type: impl Into<String>) -> Self {
        self.token_type = token_type.into();
        self
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn with_expires_on(mut self, expires_on: DateTime<Utc>) -> Self {
        self.expires_on = Some(expires_on);
        self
    }

    /// A token is usable while `now` is strictly before `expires_on`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_on {
            Some(exp) => now < exp,
            None => true,
        }
    }

    pub fn is_expired(&self) -> bool {
        !self.is_valid_at(Utc::now())
    }

    /// Whether the token expires within `margin` of `now` (or already has).
    /// A horizon past the representable range covers any finite expiry.
    pub fn expires_within(&self, margin: Duration, now: DateTime<Utc>) -> bool {
        match now.checked_add_signed(margin) {
            Some(horizon) => !self.is_valid_at(horizon),
            None => self.expires_on.is_some(),
        }
    }

    /// `Authorization` header value: `{token_type} {access_token}`.
    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }

    /// Build a token from an identity-provider response body.
    ///
    /// Accepts snake_case and camelCase member names. `expires_on` may be
    /// epoch seconds (number or numeric string) or a datetime string; when it
    /// is absent it is derived from `now + expires_in`.
    pub fn from_token_response(body: &Value, now: DateTime<Utc>) -> GraphResult<Self> {
        let access_token = string_member(body, &["access_token", "accessToken"])
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                GraphError::authentication("invalid_response", "No access_token in response")
            })?;

        let token_type = string_member(body, &["token_type", "tokenType"])
            .unwrap_or_else(|| "Bearer".to_string());
        let resource = string_member(body, &["resource"]);
        let expires_in = integer_member(body, &["expires_in", "expiresIn"]);

        let expires_on = ["expires_on", "expiresOn"]
            .iter()
            .find_map(|key| body.get(*key))
            .and_then(parse_expiry)
            .or_else(|| {
                expires_in
                    .and_then(Duration::try_seconds)
                    .and_then(|lifetime| now.checked_add_signed(lifetime))
            });

        Ok(Self {
            access_token,
            token_type,
            resource,
            expires_on,
            expires_in,
        })
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.token_type, self.access_token)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &mask(&self.access_token))
            .field("token_type", &self.token_type)
            .field("resource", &self.resource)
            .field("expires_on", &self.expires_on)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Internal helpers
// ═══════════════════════════════════════════════════════════════════════

fn mask(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 8 {
        return "*".repeat(count);
    }
    let head: String = secret.chars().take(4).collect();
    let mut tail: Vec<char> = secret.chars().rev().take(4).collect();
    tail.reverse();
    format!("{}...{}", head, tail.into_iter().collect::<String>())
}

fn string_member(body: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(String::from)
}

fn integer_member(body: &Value, keys: &[&str]) -> Option<i64> {
    keys.iter()
        .find_map(|key| body.get(*key))
        .and_then(|v| match v {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
}

fn parse_expiry(v: &Value) -> Option<DateTime<Utc>> {
    match v {
        Value::Number(n) => n.as_i64().and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        Value::String(s) => match s.trim().parse::<i64>() {
            Ok(secs) => Utc.timestamp_opt(secs, 0).single(),
            Err(_) => parse_graph_datetime(s),
        },
        _ => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
