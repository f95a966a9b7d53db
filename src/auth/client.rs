//! Login-aware client: fetch, check, re-login, re-send.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::Authenticator;
use crate::client::Client;
use crate::error::FetchError;
use crate::response::PageResponse;
use crate::retry::{RetryDecision, RetryPolicy};
use crate::session::{Session, SessionConfig};
use crate::store::FileCookieStorage;

/// Outcome of one fetch-and-verify attempt.
enum AuthStep {
    /// The response passed the login check; hand it to the caller.
    Ready(PageResponse),
    /// The session was logged out and a login just succeeded; the original
    /// request must be re-sent with the fresh cookies.
    RetryAfterLogin,
}

/// A [`Client`] that keeps its session logged in.
///
/// Every response is checked through the [`Authenticator`]; a logged-out
/// response triggers a login followed by a re-send of the original request.
/// Re-sends draw from the same bounded attempt budget as transport retries,
/// so a site that keeps logging the session out cannot loop forever. A
/// rejected credential aborts immediately without consuming the budget.
///
/// The session identity is derived from the credentials, so a later process
/// with the same credentials resumes the same persisted cookie session and
/// often skips logging in entirely.
pub struct AuthenticatedClient<A: Authenticator> {
    authenticator: A,
    client: Client,
}

impl<A: Authenticator> AuthenticatedClient<A> {
    /// Builds a client whose cookies persist under `cookie_dir`, keyed by the
    /// authenticator's credentials, with the default retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when the transport cannot be built or
    /// previously stored cookies cannot be read.
    pub fn new(authenticator: A, cookie_dir: impl AsRef<Path>) -> Result<Self, FetchError> {
        Self::with_policy(authenticator, cookie_dir, RetryPolicy::default())
    }

    /// Builds a client with an explicit retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when the transport cannot be built or
    /// previously stored cookies cannot be read.
    pub fn with_policy(
        authenticator: A,
        cookie_dir: impl AsRef<Path>,
        policy: RetryPolicy,
    ) -> Result<Self, FetchError> {
        let config = SessionConfig {
            id: authenticator.credentials().session_id(),
            ..SessionConfig::default()
        };
        let storage = Box::new(FileCookieStorage::new(cookie_dir.as_ref()));
        let session = Session::with_config(config, Some(storage))?;
        Ok(Self::from_client(
            authenticator,
            Client::with_policy(session, policy),
        ))
    }

    /// Wraps an already-configured client, for sessions needing non-default
    /// transport settings.
    #[must_use]
    pub fn from_client(authenticator: A, client: Client) -> Self {
        Self {
            authenticator,
            client,
        }
    }

    /// The authenticator driving login decisions.
    #[must_use]
    pub fn authenticator(&self) -> &A {
        &self.authenticator
    }

    /// The underlying retry client.
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// GETs a page, logging in and re-sending as needed.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidCredentials`] when a login is rejected,
    /// [`FetchError::NotAuthenticated`] when the budget runs out while the
    /// session still reads as logged out, or a transport error when the
    /// budget runs out on network failures.
    pub async fn get(&self, url: &str) -> Result<PageResponse, FetchError> {
        let mut attempt = 1;
        loop {
            let outcome = match self.client.try_get(url).await {
                Ok(response) => self.verify(url, response).await,
                Err(error) => Err(error),
            };
            // Transport errors from the fetch and from inside `login` share
            // the budget; only non-retryable errors (rejected credentials)
            // short-circuit, via the policy.
            match outcome {
                Ok(AuthStep::Ready(response)) => return Ok(response),
                Ok(AuthStep::RetryAfterLogin) => {
                    attempt = self
                        .next_attempt(url, FetchError::not_authenticated(url), attempt)
                        .await?;
                }
                Err(error) => {
                    attempt = self.next_attempt(url, error, attempt).await?;
                }
            }
        }
    }

    /// POSTs a form, logging in and re-sending as needed.
    ///
    /// The form is re-sent verbatim after a mid-flight re-login.
    ///
    /// # Errors
    ///
    /// Same contract as [`AuthenticatedClient::get`].
    pub async fn post<T>(&self, url: &str, form: &T) -> Result<PageResponse, FetchError>
    where
        T: Serialize + ?Sized + Sync,
    {
        let mut attempt = 1;
        loop {
            let outcome = match self.client.try_post(url, form).await {
                Ok(response) => self.verify(url, response).await,
                Err(error) => Err(error),
            };
            match outcome {
                Ok(AuthStep::Ready(response)) => return Ok(response),
                Ok(AuthStep::RetryAfterLogin) => {
                    attempt = self
                        .next_attempt(url, FetchError::not_authenticated(url), attempt)
                        .await?;
                }
                Err(error) => {
                    attempt = self.next_attempt(url, error, attempt).await?;
                }
            }
        }
    }

    /// Persists the session's current cookie state.
    ///
    /// # Errors
    ///
    /// Returns a storage error when persisting fails.
    pub fn flush_cookies(&mut self) -> Result<(), FetchError> {
        self.client.flush_cookies()
    }

    /// Runs the login check on a fetched response, logging in when it fails.
    ///
    /// Login errors are handed back to the attempt loop: transport trouble
    /// mid-login is as transient as transport trouble on the fetch itself,
    /// while a rejected credential is non-retryable and makes the policy
    /// give up on the spot.
    async fn verify(&self, url: &str, response: PageResponse) -> Result<AuthStep, FetchError> {
        if self.authenticator.is_logged_in(&response) {
            return Ok(AuthStep::Ready(response));
        }

        debug!(url, status = %response.status(), "response reads as logged out; logging in");
        self.authenticator.login(&self.client).await?;
        info!(url, "login succeeded; re-sending original request");
        Ok(AuthStep::RetryAfterLogin)
    }

    async fn next_attempt(
        &self,
        url: &str,
        error: FetchError,
        attempt: u32,
    ) -> Result<u32, FetchError> {
        match self.client.policy().evaluate(&error, attempt) {
            RetryDecision::Retry {
                delay,
                attempt: next,
            } => {
                debug!(url, attempt, delay_ms = delay.as_millis(), "re-attempting");
                tokio::time::sleep(delay).await;
                Ok(next)
            }
            RetryDecision::GiveUp { reason } => {
                warn!(url, attempt, reason = %reason, error = %error, "giving up");
                Err(error)
            }
        }
    }
}
