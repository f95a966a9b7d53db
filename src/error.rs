//! Error types for request dispatch, retry, and authentication.
//!
//! Transient transport failures are the only errors the retry loop will
//! re-attempt; everything else surfaces to the caller immediately. The
//! [`FetchError::is_retryable`] predicate is the single source of truth for
//! that split.

use thiserror::Error;

use crate::store::StorageError;

/// Errors that can occur while fetching a page.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// The provided URL is malformed or invalid.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The HTTP transport could not be constructed.
    #[error("failed to build HTTP transport: {source}")]
    BuildTransport {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },

    /// The login sequence itself failed.
    ///
    /// A broken credential fails identically on every attempt, so this is
    /// never retried even when raised inside a retry-wrapped call path.
    #[error("invalid credentials: {reason}")]
    InvalidCredentials {
        /// Description of why the login was rejected.
        reason: String,
    },

    /// The response indicated a logged-out session after a login was performed.
    ///
    /// This is the retry loop's cue to re-send the original request with the
    /// now-fresh cookies. It only reaches a caller when the attempt budget is
    /// exhausted while the session is still logged out.
    #[error("not authenticated for {url}")]
    NotAuthenticated {
        /// The URL whose response failed the login check.
        url: String,
    },

    /// Cookie persistence failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl FetchError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates an invalid-credentials error.
    pub fn invalid_credentials(reason: impl Into<String>) -> Self {
        Self::InvalidCredentials {
            reason: reason.into(),
        }
    }

    /// Creates a not-authenticated signal for the retry loop.
    pub fn not_authenticated(url: impl Into<String>) -> Self {
        Self::NotAuthenticated { url: url.into() }
    }

    /// Wraps a send-phase reqwest error, distinguishing timeouts.
    pub(crate) fn from_send(url: &str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::timeout(url)
        } else {
            Self::network(url, source)
        }
    }

    /// Whether a retry could plausibly change the outcome.
    ///
    /// Transport transience and a freshly re-authenticated session are worth
    /// another attempt; malformed input, rejected credentials, and storage
    /// failures are not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { .. } | Self::Timeout { .. } | Self::NotAuthenticated { .. } => true,
            Self::InvalidUrl { .. }
            | Self::BuildTransport { .. }
            | Self::InvalidCredentials { .. }
            | Self::Storage(_) => false,
        }
    }
}
