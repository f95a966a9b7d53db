//! Resilient request client: a [`Session`] wrapped in bounded retry.
//!
//! Every logical `get`/`post` is re-attempted on transient transport failure
//! according to the configured [`RetryPolicy`], with a randomized pause
//! between attempts. The single-attempt `try_*` variants are the raw calls;
//! the authentication layer composes them under its own loop so one budget
//! covers both transport failures and re-login rounds.

use serde::Serialize;
use tracing::{debug, warn};

use crate::document::Document;
use crate::error::FetchError;
use crate::response::PageResponse;
use crate::retry::{RetryDecision, RetryPolicy};
use crate::session::Session;

/// HTTP client with bounded, jittered retry around a [`Session`].
pub struct Client {
    session: Session,
    policy: RetryPolicy,
}

impl Client {
    /// Wraps a session with the default retry policy.
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self::with_policy(session, RetryPolicy::default())
    }

    /// Wraps a session with an explicit retry policy.
    #[must_use]
    pub fn with_policy(session: Session, policy: RetryPolicy) -> Self {
        Self { session, policy }
    }

    /// The underlying session.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Mutable access to the underlying session.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// The retry policy in effect.
    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Issues a single GET attempt, no retry.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on invalid URLs and transport failures.
    pub async fn try_get(&self, url: &str) -> Result<PageResponse, FetchError> {
        debug!(method = "GET", url, "dispatching request");
        self.session.get(url).await
    }

    /// Issues a single form POST attempt, no retry.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on invalid URLs and transport failures.
    pub async fn try_post<T>(&self, url: &str, form: &T) -> Result<PageResponse, FetchError>
    where
        T: Serialize + ?Sized,
    {
        debug!(method = "POST", url, "dispatching request");
        self.session.post(url, form).await
    }

    /// Issues a GET request, retrying transient failures within the attempt
    /// budget.
    ///
    /// # Errors
    ///
    /// Returns the last attempt's [`FetchError`] once the policy gives up.
    pub async fn get(&self, url: &str) -> Result<PageResponse, FetchError> {
        let mut attempt = 1;
        loop {
            match self.try_get(url).await {
                Ok(response) => return Ok(response),
                Err(error) => attempt = self.handle_failure(url, error, attempt).await?,
            }
        }
    }

    /// Issues a form POST request, retrying transient failures within the
    /// attempt budget.
    ///
    /// # Errors
    ///
    /// Returns the last attempt's [`FetchError`] once the policy gives up.
    pub async fn post<T>(&self, url: &str, form: &T) -> Result<PageResponse, FetchError>
    where
        T: Serialize + ?Sized,
    {
        let mut attempt = 1;
        loop {
            match self.try_post(url, form).await {
                Ok(response) => return Ok(response),
                Err(error) => attempt = self.handle_failure(url, error, attempt).await?,
            }
        }
    }

    /// GETs a page and parses its body into an HTML document handle.
    ///
    /// # Errors
    ///
    /// Returns the last attempt's [`FetchError`] once the policy gives up.
    pub async fn get_document(&self, url: &str) -> Result<Document, FetchError> {
        Ok(self.get(url).await?.document())
    }

    /// POSTs a form and parses the response body into an HTML document handle.
    ///
    /// # Errors
    ///
    /// Returns the last attempt's [`FetchError`] once the policy gives up.
    pub async fn post_document<T>(&self, url: &str, form: &T) -> Result<Document, FetchError>
    where
        T: Serialize + ?Sized,
    {
        Ok(self.post(url, form).await?.document())
    }

    /// Persists the session's current cookie state.
    ///
    /// # Errors
    ///
    /// Returns a storage error when persisting fails.
    pub fn flush_cookies(&mut self) -> Result<(), FetchError> {
        self.session.flush_cookies()?;
        Ok(())
    }

    /// Evaluates a failed attempt, sleeping and returning the next attempt
    /// number on retry, or propagating the error on give-up.
    async fn handle_failure(
        &self,
        url: &str,
        error: FetchError,
        attempt: u32,
    ) -> Result<u32, FetchError> {
        match self.policy.evaluate(&error, attempt) {
            RetryDecision::Retry {
                delay,
                attempt: next,
            } => {
                warn!(
                    url,
                    attempt,
                    delay_ms = delay.as_millis(),
                    error = %error,
                    "attempt failed; retrying after delay"
                );
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
