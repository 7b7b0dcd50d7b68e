//! Credential model: OAuth tokens plus the scopes they were granted for

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Tokens expiring within this window are treated as already expired
const EXPIRY_BUFFER_SECS: i64 = 300;

/// A named permission grant on the mailbox
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Scope {
    #[serde(rename = "https://www.googleapis.com/auth/gmail.readonly")]
    Read,
    #[serde(rename = "https://www.googleapis.com/auth/gmail.send")]
    Send,
}

impl Scope {
    /// OAuth scope URL for this grant
    pub fn url(self) -> &'static str {
        match self {
            Scope::Read => "https://www.googleapis.com/auth/gmail.readonly",
            Scope::Send => "https://www.googleapis.com/auth/gmail.send",
        }
    }

    fn from_url(url: &str) -> Option<Self> {
        [Scope::Read, Scope::Send]
            .into_iter()
            .find(|scope| scope.url() == url)
    }
}

/// An ordered set of scopes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeSet(BTreeSet<Scope>);

impl ScopeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the space-separated `scope` string returned by the token endpoint.
    /// Scopes this client does not know about are ignored.
    pub fn from_granted(granted: &str) -> Self {
        granted.split_whitespace().filter_map(Scope::from_url).collect()
    }

    pub fn contains(&self, scope: Scope) -> bool {
        self.0.contains(&scope)
    }

    /// Whether every scope in `required` is granted
    pub fn covers(&self, required: &ScopeSet) -> bool {
        required.0.is_subset(&self.0)
    }

    /// Scopes in `required` that are not granted
    pub fn missing_from(&self, required: &ScopeSet) -> ScopeSet {
        ScopeSet(required.0.difference(&self.0).copied().collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = Scope> + '_ {
        self.0.iter().copied()
    }

    /// Space-separated scope URLs, as sent in an authorization request
    pub fn to_request_param(&self) -> String {
        self.iter().map(Scope::url).collect::<Vec<_>>().join(" ")
    }
}

impl FromIterator<Scope> for ScopeSet {
    fn from_iter<I: IntoIterator<Item = Scope>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for ScopeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_request_param())
    }
}

/// An access/refresh token pair with its expiry and granted scopes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub scopes: ScopeSet,
}

impl Credential {
    /// Whether the access token is expired (or about to be) at `now`
    ///
    /// A credential without a known expiry is treated as expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at <= now + Duration::seconds(EXPIRY_BUFFER_SECS),
            None => true,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.is_some()
    }

    /// Usable for `required` right now: unexpired and covering every scope
    pub fn is_valid_for(&self, required: &ScopeSet) -> bool {
        self.scopes.covers(required) && !self.is_expired()
    }
}
