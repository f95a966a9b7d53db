//! Normalized cookie records as persisted to durable storage.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One persisted cookie.
///
/// This is the storage-side representation: flat, serializable, and carrying
/// everything needed to reconstruct the live jar state in a later process.
/// The (name, domain, path) triplet is the natural de-duplication key within
/// one jar.
///
/// The value field is intentionally redacted in Debug output to prevent
/// accidental logging of sensitive cookie data.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieRecord {
    /// Cookie protocol version (0 for original Netscape cookies).
    #[serde(default)]
    pub version: u32,
    /// Cookie name.
    pub name: String,
    /// Cookie value (sensitive, never log).
    value: String,
    /// Port restriction, if any.
    #[serde(default)]
    pub port: Option<String>,
    /// The domain the cookie belongs to. A leading dot means subdomains match.
    pub domain: String,
    /// The URL path scope for the cookie.
    pub path: String,
    /// Whether the cookie should only be sent over HTTPS.
    #[serde(default)]
    pub secure: bool,
    /// Unix timestamp for expiry; `None` for session cookies.
    #[serde(default)]
    pub expires: Option<u64>,
    /// Whether the cookie should be discarded at session end.
    #[serde(default)]
    pub discard: bool,
    /// RFC 2965 Comment attribute, if any.
    #[serde(default)]
    pub comment: Option<String>,
    /// RFC 2965 CommentURL attribute, if any.
    #[serde(default)]
    pub comment_url: Option<String>,
    /// Whether the cookie was received as an RFC 2109 cookie.
    #[serde(default)]
    pub rfc2109: bool,
}

impl CookieRecord {
    /// Creates a session cookie with the given identity and scope.
    ///
    /// Version 0, no port restriction, not secure, no expiry, discarded at
    /// session end. Adjust the public fields for anything richer.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        domain: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            version: 0,
            name: name.into(),
            value: value.into(),
            port: None,
            domain: domain.into(),
            path: path.into(),
            secure: false,
            expires: None,
            discard: true,
            comment: None,
            comment_url: None,
            rfc2109: false,
        }
    }

    /// Returns the cookie value.
    ///
    /// Cookie values are sensitive; avoid logging the return value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replaces the cookie value.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    /// Whether `other` occupies the same (name, domain, path) slot in a jar.
    #[must_use]
    pub fn same_slot(&self, other: &Self) -> bool {
        self.name == other.name && self.domain == other.domain && self.path == other.path
    }

    /// Whether the cookie is expired at the given Unix timestamp.
    ///
    /// Session cookies (no expiry) never expire by time.
    #[must_use]
    pub fn is_expired_at(&self, now: u64) -> bool {
        self.expires.is_some_and(|deadline| deadline <= now)
    }
}

// Custom Debug impl that redacts the cookie value.
impl fmt::Debug for CookieRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieRecord")
            .field("version", &self.version)
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .field("port", &self.port)
            .field("domain", &self.domain)
            .field("path", &self.path)
            .field("secure", &self.secure)
            .field("expires", &self.expires)
            .field("discard", &self.discard)
            .field("comment", &self.comment)
            .field("comment_url", &self.comment_url)
            .field("rfc2109", &self.rfc2109)
            .finish()
    }
}

/// Ordered sequence of cookie records belonging to exactly one session id.
///
/// Created empty or loaded from storage at session construction, fully
/// replaced (not merged) on every flush.
pub type CookieSet = Vec<CookieRecord>;
