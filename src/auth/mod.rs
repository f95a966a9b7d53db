//! Authentication: the authenticator seam and the login-aware client.
//!
//! Sites differ wildly in how "logged in" looks and how a login is performed,
//! so both live behind the [`Authenticator`] trait. The base behavior is
//! deliberately inert: every response reads as logged out and every login
//! attempt fails with [`FetchError::InvalidCredentials`]. A usable
//! authenticator overrides both; the [`AuthenticatedClient`] drives them.

mod client;
mod credentials;

use async_trait::async_trait;

use crate::client::Client;
use crate::error::FetchError;
use crate::response::PageResponse;

pub use client::AuthenticatedClient;
pub use credentials::Credentials;

/// Site-specific login protocol.
///
/// Implementations are consulted after every fetch: when [`is_logged_in`]
/// returns `false`, the driving client calls [`login`] and re-sends the
/// original request with the refreshed session cookies.
///
/// [`is_logged_in`]: Authenticator::is_logged_in
/// [`login`]: Authenticator::login
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// The credentials this authenticator logs in with.
    fn credentials(&self) -> &Credentials;

    /// Whether the response reflects a logged-in session.
    ///
    /// The base implementation treats everything as logged out, which forces
    /// a login attempt on the first fetch. Typical overrides look for an
    /// account link or the absence of a login form in the body.
    fn is_logged_in(&self, response: &PageResponse) -> bool {
        let _ = response;
        false
    }

    /// Performs the site's login sequence using the given client.
    ///
    /// On success the session's jar holds whatever cookies the site set
    /// during login; the driver then re-sends the original request.
    ///
    /// # Errors
    ///
    /// The base implementation always fails with
    /// [`FetchError::InvalidCredentials`]: there is no generic way to log in.
    /// Overrides should return the same error for rejected credentials and
    /// transport errors for network trouble mid-login.
    async fn login(&self, client: &Client) -> Result<(), FetchError> {
        let _ = client;
        Err(FetchError::invalid_credentials(
            "no login sequence implemented for this site",
        ))
    }
}

/// The inert base authenticator: never logged in, cannot log in.
///
/// Useful as a placeholder and for exercising the worst-case path in tests.
pub struct DenyAll {
    credentials: Credentials,
}

impl DenyAll {
    /// Wraps credentials without any login capability.
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }
}

#[async_trait]
impl Authenticator for DenyAll {
    fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}
