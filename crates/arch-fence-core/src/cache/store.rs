//! Content-addressed key/value stores backing the incremental cache.
//!
//! A store alone decides whether an entry is still valid. The engine never
//! computes fingerprints; it only asks for a key and gets a blob or nothing.

use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Length of the sha256 fingerprint prefixed to every on-disk entry.
const FINGERPRINT_LEN: usize = 32;

/// Errors talking to a store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing an entry (or its source file) failed.
    #[error("cache store I/O error on {path}: {source}")]
    Io {
        /// Path involved.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
}

/// A key/value store whose entries are invalidated by content changes.
pub trait ContentStore: Send + Sync {
    /// Returns the blob stored for `key`, or `None` if absent or stale.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Stores `blob` for `key`, replacing any previous entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    fn store(&self, key: &str, blob: &[u8]) -> Result<(), StoreError>;
}

/// Stores entries as files under a cache directory.
///
/// Each entry file is named after the sha256 of its key and starts with the
/// sha256 of the source file's content. A lookup re-hashes the source file
/// and treats a mismatch as a miss.
///
/// The fingerprint taken by a missed lookup is the one written by the next
/// [`store`](ContentStore::store) for that key, so an edit made while the
/// file is being analyzed leaves an entry that no longer matches.
#[derive(Debug)]
pub struct FsContentStore {
    dir: PathBuf,
    source_root: PathBuf,
    pending: Mutex<HashMap<String, [u8; FINGERPRINT_LEN]>>,
}

impl FsContentStore {
    /// Opens (creating if needed) a store in `dir` for sources under `source_root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory cannot be created.
    pub fn open(
        dir: impl Into<PathBuf>,
        source_root: impl Into<PathBuf>,
    ) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| StoreError::Io {
            path: dir.clone(),
            source: e,
        })?;
        Ok(Self {
            dir,
            source_root: source_root.into(),
            pending: Mutex::new(HashMap::new()),
        })
    }

    /// Returns the cache directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        self.dir.join(format!("{:x}.entry", hasher.finalize()))
    }

    fn fingerprint(&self, key: &str) -> Result<[u8; FINGERPRINT_LEN], StoreError> {
        let source = self.source_root.join(key);
        let content = std::fs::read(&source).map_err(|e| StoreError::Io {
            path: source,
            source: e,
        })?;
        let mut hasher = Sha256::new();
        hasher.update(&content);
        let mut fingerprint = [0u8; FINGERPRINT_LEN];
        fingerprint.copy_from_slice(&hasher.finalize());
        Ok(fingerprint)
    }

    fn remember(&self, key: &str, fingerprint: [u8; FINGERPRINT_LEN]) {
        self.pending.lock().insert(key.to_string(), fingerprint);
    }
}

impl ContentStore for FsContentStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let current = self.fingerprint(key);
        let entry = self.entry_path(key);
        let raw = match std::fs::read(&entry) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if let Ok(current) = current {
                    self.remember(key, current);
                }
                return Ok(None);
            }
            Err(e) => {
                return Err(StoreError::Io {
                    path: entry,
                    source: e,
                })
            }
        };
        let current = current?;

        if raw.len() < FINGERPRINT_LEN {
            debug!("Ignoring short cache entry for {key}");
            self.remember(key, current);
            return Ok(None);
        }

        let (stored, payload) = raw.split_at(FINGERPRINT_LEN);
        if stored != current.as_slice() {
            debug!("Fingerprint changed for {key}");
            self.remember(key, current);
            return Ok(None);
        }

        Ok(Some(payload.to_vec()))
    }

    fn store(&self, key: &str, blob: &[u8]) -> Result<(), StoreError> {
        let pending = self.pending.lock().remove(key);
        let fingerprint = match pending {
            Some(fingerprint) => fingerprint,
            None => self.fingerprint(key)?,
        };
        let mut raw = Vec::with_capacity(FINGERPRINT_LEN + blob.len());
        raw.extend_from_slice(&fingerprint);
        raw.extend_from_slice(blob);

        let entry = self.entry_path(key);
        let tmp = entry.with_extension("tmp");
        std::fs::write(&tmp, &raw)
            .and_then(|()| std::fs::rename(&tmp, &entry))
            .map_err(|e| StoreError::Io {
                path: entry,
                source: e,
            })
    }
}

/// An in-process store with no invalidation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl ContentStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn store(&self, key: &str, blob: &[u8]) -> Result<(), StoreError> {
        self.entries.lock().insert(key.to_string(), blob.to_vec());
        Ok(())
    }
}

impl<S: ContentStore + ?Sized> ContentStore for std::sync::Arc<S> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get(key)
    }

    fn store(&self, key: &str, blob: &[u8]) -> Result<(), StoreError> {
        (**self).store(key, blob)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_store_round_trip() {
        let src = tempfile::tempdir().unwrap();
        let cache = tempfile::tempdir().unwrap();
        std::fs::write(src.path().join("a.rs"), "use std::fs;").unwrap();

        let store = FsContentStore::open(cache.path(), src.path()).unwrap();
        assert_eq!(store.get("a.rs").unwrap(), None);

        store.store("a.rs", b"payload").unwrap();
        assert_eq!(store.get("a.rs").unwrap().as_deref(), Some(&b"payload"[..]));
    }

    #[test]
    fn fs_store_invalidates_on_content_change() {
        let src = tempfile::tempdir().unwrap();
        let cache = tempfile::tempdir().unwrap();
        let file = src.path().join("a.rs");
        std::fs::write(&file, "use std::fs;").unwrap();

        let store = FsContentStore::open(cache.path(), src.path()).unwrap();
        store.store("a.rs", b"payload").unwrap();

        std::fs::write(&file, "use std::io;").unwrap();
        assert_eq!(store.get("a.rs").unwrap(), None);
    }

    #[test]
    fn fs_store_keeps_fingerprint_of_the_missed_lookup() {
        let src = tempfile::tempdir().unwrap();
        let cache = tempfile::tempdir().unwrap();
        let file = src.path().join("a.rs");
        std::fs::write(&file, "use std::fs;").unwrap();

        let store = FsContentStore::open(cache.path(), src.path()).unwrap();
        assert_eq!(store.get("a.rs").unwrap(), None);

        // Edited between lookup and store: the entry belongs to the old content.
        std::fs::write(&file, "use crate::db;").unwrap();
        store.store("a.rs", b"clean").unwrap();
        assert_eq!(store.get("a.rs").unwrap(), None);

        store.store("a.rs", b"dirty").unwrap();
        assert_eq!(store.get("a.rs").unwrap().as_deref(), Some(&b"dirty"[..]));
    }

    #[test]
    fn fs_store_empty_payload_is_a_hit() {
        let src = tempfile::tempdir().unwrap();
        let cache = tempfile::tempdir().unwrap();
        std::fs::write(src.path().join("a.rs"), "").unwrap();

        let store = FsContentStore::open(cache.path(), src.path()).unwrap();
        store.store("a.rs", b"").unwrap();
        assert_eq!(store.get("a.rs").unwrap(), Some(Vec::new()));
    }

    #[test]
    fn fs_store_open_fails_on_file() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        assert!(FsContentStore::open(blocker.join("cache"), tmp.path()).is_err());
    }

    #[test]
    fn memory_store() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        store.store("k", b"v").unwrap();
        assert_eq!(store.get("k").unwrap(), Some(b"v".to_vec()));
        assert_eq!(store.len(), 1);
    }
}
