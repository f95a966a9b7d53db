//! webgrab: resilient HTTP client for automated web interaction.
//!
//! This library wraps a connection-reusing HTTP transport with the three
//! things long-running scraping jobs always end up needing:
//!
//! - bounded retry of transient network failures with randomized jitter
//!   delays ([`RetryPolicy`]),
//! - session cookies that survive process restarts, keyed by an opaque
//!   session identity ([`CookieStorage`] / [`FileCookieStorage`]),
//! - login detection and automatic re-authentication for sites that expire
//!   sessions mid-run ([`Authenticator`] / [`AuthenticatedClient`]).
//!
//! # Architecture
//!
//! - [`cookies`] - normalized cookie records and the enumerable jar that
//!   bridges them to the HTTP transport
//! - [`store`] - durable cookie persistence, pluggable backend
//! - [`session`] - transport ownership and cookie wiring
//! - [`client`] - retry-wrapped GET/POST and HTML document fetching
//! - [`auth`] - credentials, the authenticator seam, and the login-aware
//!   client
//!
//! # Example
//!
//! ```no_run
//! use webgrab::{Client, Session};
//!
//! # async fn example() -> Result<(), webgrab::FetchError> {
//! let client = Client::new(Session::new()?);
//! let page = client.get("https://example.com/listing").await?;
//! println!("{}", page.status());
//! # Ok(())
//! # }
//! ```

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod client;
pub mod cookies;
pub mod document;
pub mod error;
pub mod response;
pub mod retry;
pub mod session;
pub mod store;

// Re-export commonly used types
pub use auth::{AuthenticatedClient, Authenticator, Credentials, DenyAll};
pub use client::Client;
pub use cookies::{CookieRecord, CookieSet, RecordJar};
pub use document::Document;
pub use error::FetchError;
pub use response::PageResponse;
pub use retry::{DEFAULT_MAX_ATTEMPTS, RetryDecision, RetryPolicy};
pub use session::{BROWSER_USER_AGENT, Session, SessionConfig, SessionId};
pub use store::{CookieStorage, FileCookieStorage, StorageError};
