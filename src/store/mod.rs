//! Durable cookie persistence with a pluggable backend.
//!
//! A [`CookieStorage`] maps one session identity to one stored [`CookieSet`].
//! The store is bound exactly once, at session construction, to the session's
//! live jar and identity; after that, `load` restores the previously
//! persisted set and `flush` replaces it with the jar's current state.
//! Storage backends are deliberately single-writer: two live sessions
//! sharing an identity and racing to flush is a caller bug, not something
//! the store locks against.

mod file;

use std::path::PathBuf;
use std::sync::Arc;

use crate::cookies::{CookieSet, RecordJar};
use crate::session::SessionId;

pub use file::FileCookieStorage;

/// Errors for cookie storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The store was used before being bound to a live session.
    ///
    /// Binding happens at session construction; hitting this is a
    /// programming error, never a transient condition.
    #[error("cookie storage is not bound to any session")]
    NotBound,

    /// Filesystem I/O failed.
    #[error("cookie store I/O failed at {path}: {source}")]
    Io {
        /// The backing path involved.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Serialization/deserialization of the stored cookie set failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Persists and restores the cookie set of exactly one session.
///
/// `Sync` is required because the owning session is borrowed across await
/// points inside authenticator login sequences.
pub trait CookieStorage: Send + Sync {
    /// Associates the store with a session's live jar and identity.
    ///
    /// Called once, by [`Session`](crate::Session) construction. Rebinding
    /// replaces the previous association.
    fn bind(&mut self, jar: Arc<RecordJar>, session_id: SessionId);

    /// Restores the stored cookie set for the bound identity.
    ///
    /// Nothing stored yet is not an error: the result is an empty set.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotBound`] before binding, or a backend error
    /// when stored data exists but cannot be read or decoded.
    fn load(&mut self) -> Result<CookieSet, StorageError>;

    /// Snapshots the bound jar, replaces the stored set with it, persists,
    /// and returns the new set.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotBound`] before binding (no I/O is
    /// performed), or a backend error when persisting fails.
    fn flush(&mut self) -> Result<CookieSet, StorageError>;
}
