//! File-backed cookie storage: one JSON file per session identity.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, instrument};

use super::{CookieStorage, StorageError};
use crate::cookies::{CookieSet, RecordJar};
use crate::session::SessionId;

struct Binding {
    jar: Arc<RecordJar>,
    session_id: SessionId,
}

/// Stores each session's cookie set as `<dir>/<session-id>.json`.
///
/// The file is a plain JSON array of cookie records. An absent file is
/// equivalent to an empty set; an unreadable or syntactically invalid file is
/// a real error: silently discarding a corrupt session would look like an
/// inexplicable logout.
pub struct FileCookieStorage {
    dir: PathBuf,
    binding: Option<Binding>,
}

impl FileCookieStorage {
    /// Creates a store rooted at `dir`. The directory is created lazily on
    /// the first flush.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            binding: None,
        }
    }

    /// The backing file path for the bound session, if bound.
    #[must_use]
    pub fn backing_path(&self) -> Option<PathBuf> {
        self.binding
            .as_ref()
            .map(|binding| cookie_file_path(&self.dir, &binding.session_id))
    }
}

fn cookie_file_path(dir: &Path, session_id: &SessionId) -> PathBuf {
    dir.join(format!("{session_id}.json"))
}

impl CookieStorage for FileCookieStorage {
    fn bind(&mut self, jar: Arc<RecordJar>, session_id: SessionId) {
        debug!(session_id = %session_id, dir = %self.dir.display(), "binding cookie storage");
        self.binding = Some(Binding { jar, session_id });
    }

    #[instrument(level = "debug", skip(self))]
    fn load(&mut self) -> Result<CookieSet, StorageError> {
        let binding = self.binding.as_ref().ok_or(StorageError::NotBound)?;
        let path = cookie_file_path(&self.dir, &binding.session_id);

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no stored cookies; starting empty");
                return Ok(CookieSet::new());
            }
            Err(error) => return Err(StorageError::io(path, error)),
        };

        let records: CookieSet = serde_json::from_slice(&bytes)?;
        debug!(path = %path.display(), count = records.len(), "loaded stored cookies");
        Ok(records)
    }

    #[instrument(level = "debug", skip(self))]
    fn flush(&mut self) -> Result<CookieSet, StorageError> {
        let binding = self.binding.as_ref().ok_or(StorageError::NotBound)?;
        let path = cookie_file_path(&self.dir, &binding.session_id);

        let records = binding.jar.snapshot();
        let payload = serde_json::to_vec_pretty(&records)?;

        fs::create_dir_all(&self.dir).map_err(|error| StorageError::io(&self.dir, error))?;
        fs::write(&path, payload).map_err(|error| StorageError::io(&path, error))?;

        debug!(path = %path.display(), count = records.len(), "flushed cookies");
        Ok(records)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cookies::CookieRecord;
    use tempfile::TempDir;

    fn bound_store(dir: &Path, id: &SessionId) -> (FileCookieStorage, Arc<RecordJar>) {
        let jar = Arc::new(RecordJar::new());
        let mut store = FileCookieStorage::new(dir);
        store.bind(Arc::clone(&jar), id.clone());
        (store, jar)
    }

    #[test]
    fn test_flush_unbound_fails_without_io() {
        let temp = TempDir::new().unwrap();
        let mut store = FileCookieStorage::new(temp.path());

        let result = store.flush();
        assert!(matches!(result, Err(StorageError::NotBound)));

        let entries: Vec<_> = fs::read_dir(temp.path()).unwrap().collect();
        assert!(entries.is_empty(), "unbound flush must not touch the disk");
    }

    #[test]
    fn test_load_unbound_fails() {
        let temp = TempDir::new().unwrap();
        let mut store = FileCookieStorage::new(temp.path());
        assert!(matches!(store.load(), Err(StorageError::NotBound)));
    }

    #[test]
    fn test_load_missing_file_yields_empty_set() {
        let temp = TempDir::new().unwrap();
        let (mut store, _jar) = bound_store(temp.path(), &SessionId::random());

        let set = store.load().unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_flush_then_load_round_trip() {
        let temp = TempDir::new().unwrap();
        let id = SessionId::random();
        let (mut store, jar) = bound_store(temp.path(), &id);

        jar.seed(&[
            CookieRecord::new("sid", "abc", "example.test", "/"),
            CookieRecord::new("pref", "1", "example.test", "/"),
        ]);
        let flushed = store.flush().unwrap();
        assert_eq!(flushed.len(), 2);

        // A freshly constructed store bound to the same identity sees the
        // same records, in order.
        let (mut second, _jar2) = bound_store(temp.path(), &id);
        let loaded = second.load().unwrap();
        assert_eq!(loaded, flushed);
        assert_eq!(loaded[0].name, "sid");
        assert_eq!(loaded[1].name, "pref");
    }

    #[test]
    fn test_flush_replaces_previous_contents() {
        let temp = TempDir::new().unwrap();
        let id = SessionId::random();
        let (mut store, jar) = bound_store(temp.path(), &id);

        jar.seed(&[
            CookieRecord::new("sid", "abc", "example.test", "/"),
            CookieRecord::new("pref", "1", "example.test", "/"),
        ]);
        store.flush().unwrap();

        // The stored set is fully replaced, never merged.
        jar.seed(&[CookieRecord::new("sid", "fresh", "example.test", "/")]);
        store.flush().unwrap();

        let (mut reader, _jar2) = bound_store(temp.path(), &id);
        let loaded = reader.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].value(), "fresh");
    }

    #[test]
    fn test_distinct_identities_use_distinct_files() {
        let temp = TempDir::new().unwrap();
        let first_id = SessionId::random();
        let second_id = SessionId::random();

        let (mut first, jar) = bound_store(temp.path(), &first_id);
        jar.seed(&[CookieRecord::new("sid", "abc", "example.test", "/")]);
        first.flush().unwrap();

        let (mut second, _jar2) = bound_store(temp.path(), &second_id);
        assert!(second.load().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_file_is_an_error_not_empty() {
        let temp = TempDir::new().unwrap();
        let id = SessionId::random();
        fs::write(temp.path().join(format!("{id}.json")), b"{not json").unwrap();

        let (mut store, _jar) = bound_store(temp.path(), &id);
        assert!(matches!(store.load(), Err(StorageError::Json(_))));
    }

    #[test]
    fn test_backing_path_named_by_identity() {
        let temp = TempDir::new().unwrap();
        let id = SessionId::random();
        let (store, _jar) = bound_store(temp.path(), &id);

        let path = store.backing_path().unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            format!("{id}.json")
        );
    }

    #[test]
    fn test_flush_creates_missing_directory() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("state").join("cookies");
        let jar = Arc::new(RecordJar::new());
        let mut store = FileCookieStorage::new(&nested);
        store.bind(Arc::clone(&jar), SessionId::random());

        jar.seed(&[CookieRecord::new("sid", "abc", "example.test", "/")]);
        store.flush().unwrap();
        assert!(nested.exists());
    }
}
