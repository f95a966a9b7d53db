//! Session: one owned HTTP transport plus its cookie wiring.
//!
//! A [`Session`] is a thin composition root, not a behavioral layer. It owns
//! one connection-reusing `reqwest::Client` for its whole lifetime, installs
//! an enumerable cookie jar when cookies are enabled, binds and pre-loads an
//! optional [`CookieStorage`], and passes the request verbs straight through.
//! Retry and authentication live above it.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use crate::cookies::{CookieSet, RecordJar};
use crate::error::FetchError;
use crate::response::PageResponse;
use crate::store::{CookieStorage, StorageError};

/// Fixed browser-like User-Agent sent on all cookie-bearing sessions.
///
/// Scraping targets routinely vary responses on the UA; a stable desktop
/// browser string keeps them on the ordinary HTML path.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

const CONNECT_TIMEOUT_SECS: u64 = 10;
const READ_TIMEOUT_SECS: u64 = 30;

/// Opaque identity keying a persisted cookie set.
///
/// Random for anonymous sessions; derived deterministically from credentials
/// for authenticated ones (see [`Credentials`](crate::Credentials)).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Wraps an explicit identity string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random identity (UUID v4).
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Construction parameters for a [`Session`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Identity keying cookie persistence. Default: freshly generated.
    pub id: SessionId,
    /// Whether the transport carries a cookie jar at all. Disabled is the
    /// lightest-weight mode: every call is stateless.
    pub cookies_enabled: bool,
    /// Accept invalid/self-signed TLS certificates for this session only.
    ///
    /// Scraping targets are often misconfigured; this stays an explicit
    /// per-session opt-in, never a process-wide default.
    pub accept_invalid_certs: bool,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Read timeout in seconds.
    pub read_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            id: SessionId::random(),
            cookies_enabled: true,
            accept_invalid_certs: false,
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            read_timeout_secs: READ_TIMEOUT_SECS,
        }
    }
}

/// One HTTP transport that reuses connections and accumulates cookies across
/// calls within its lifetime.
///
/// When a [`CookieStorage`] is attached, the stored set is loaded and seeded
/// into the jar before the first request, and flushed back on [`Drop`] (and
/// via [`Session::flush_cookies`]).
pub struct Session {
    client: reqwest::Client,
    jar: Option<Arc<RecordJar>>,
    storage: Option<Box<dyn CookieStorage>>,
    id: SessionId,
}

impl Session {
    /// Creates a cookie-bearing session with a random identity and no
    /// persistence.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::BuildTransport`] when the HTTP client cannot be
    /// constructed.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_config(SessionConfig::default(), None)
    }

    /// Creates a session from explicit configuration and optional storage.
    ///
    /// With cookies enabled, the transport gets a fresh [`RecordJar`] and the
    /// fixed [`BROWSER_USER_AGENT`]; a supplied storage is bound to the jar
    /// and identity, loaded, and its contents seeded into the jar. With
    /// cookies disabled, storage is ignored (there is no state to persist).
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::BuildTransport`] when the HTTP client cannot be
    /// constructed, or a [`StorageError`] when previously stored cookies
    /// exist but cannot be read.
    pub fn with_config(
        config: SessionConfig,
        storage: Option<Box<dyn CookieStorage>>,
    ) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.read_timeout_secs))
            .gzip(true);

        if config.accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let (jar, storage) = if config.cookies_enabled {
            let jar = Arc::new(RecordJar::new());
            builder = builder
                .cookie_provider(Arc::clone(&jar))
                .user_agent(BROWSER_USER_AGENT);

            let storage = match storage {
                Some(mut storage) => {
                    storage.bind(Arc::clone(&jar), config.id.clone());
                    let stored = storage.load()?;
                    if !stored.is_empty() {
                        debug!(
                            session_id = %config.id,
                            count = stored.len(),
                            "seeding jar from stored cookies"
                        );
                    }
                    jar.seed(&stored);
                    Some(storage)
                }
                None => None,
            };
            (Some(jar), storage)
        } else {
            if storage.is_some() {
                warn!("cookie storage supplied but cookies are disabled; ignoring storage");
            }
            (None, None)
        };

        let client = builder
            .build()
            .map_err(|source| FetchError::BuildTransport { source })?;

        Ok(Self {
            client,
            jar,
            storage,
            id: config.id,
        })
    }

    /// The session's identity.
    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// The live cookie jar, when cookies are enabled.
    #[must_use]
    pub fn jar(&self) -> Option<&Arc<RecordJar>> {
        self.jar.as_ref()
    }

    /// Issues a GET request.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on invalid URLs and transport failures.
    pub async fn get(&self, url: &str) -> Result<PageResponse, FetchError> {
        let target = parse_url(url)?;
        self.dispatch(self.client.get(target), url).await
    }

    /// Issues a POST request with a form-encoded body.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on invalid URLs and transport failures.
    pub async fn post<T>(&self, url: &str, form: &T) -> Result<PageResponse, FetchError>
    where
        T: Serialize + ?Sized,
    {
        let target = parse_url(url)?;
        self.dispatch(self.client.post(target).form(form), url).await
    }

    /// Issues a HEAD request.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on invalid URLs and transport failures.
    pub async fn head(&self, url: &str) -> Result<PageResponse, FetchError> {
        let target = parse_url(url)?;
        self.dispatch(self.client.head(target), url).await
    }

    /// Issues a PUT request with a form-encoded body.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on invalid URLs and transport failures.
    pub async fn put<T>(&self, url: &str, form: &T) -> Result<PageResponse, FetchError>
    where
        T: Serialize + ?Sized,
    {
        let target = parse_url(url)?;
        self.dispatch(self.client.put(target).form(form), url).await
    }

    /// Issues a DELETE request.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on invalid URLs and transport failures.
    pub async fn delete(&self, url: &str) -> Result<PageResponse, FetchError> {
        let target = parse_url(url)?;
        self.dispatch(self.client.delete(target), url).await
    }

    async fn dispatch(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<PageResponse, FetchError> {
        let response = request
            .send()
            .await
            .map_err(|error| FetchError::from_send(url, error))?;
        PageResponse::read(response).await
    }

    /// Copies live jar state into the attached storage, replacing what was
    /// previously stored.
    ///
    /// With no storage attached this is a no-op returning an empty set.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] when persisting fails.
    pub fn flush_cookies(&mut self) -> Result<CookieSet, StorageError> {
        match self.storage.as_mut() {
            Some(storage) => storage.flush(),
            None => Ok(CookieSet::new()),
        }
    }
}

impl Drop for Session {
    // Scoped-exit contract: whatever cookie state the session ended with is
    // persisted, successful run or not.
    fn drop(&mut self) {
        if self.storage.is_some() {
            if let Err(error) = self.flush_cookies() {
                warn!(session_id = %self.id, error = %error, "failed to flush cookies on teardown");
            }
        }
    }
}

fn parse_url(url: &str) -> Result<Url, FetchError> {
    Url::parse(url).map_err(|_| FetchError::invalid_url(url))
}
