//! Incremental result cache.
//!
//! [`ResultCache`] is the only cache capability the analyzer sees. Which
//! implementation backs it is decided once, when the analyzer is built:
//! [`StoreCache`] when incremental mode is on, [`NullCache`] otherwise.

mod store;

pub use store::{ContentStore, FsContentStore, MemoryStore, StoreError};

use crate::codec::{CodecError, PayloadCodec};
use crate::path;
use crate::types::{Violation, ViolationSet};

/// Errors from the result cache.
///
/// None of these is fatal to a run: a corrupted entry is a miss, and an
/// unavailable store only costs the speed-up.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An entry was found but its payload could not be decoded.
    #[error("corrupted cache entry for {key}: {source}")]
    Corrupted {
        /// Cache key of the entry.
        key: String,
        /// Decode failure.
        source: CodecError,
    },

    /// The backing store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Per-file result cache capability.
pub trait ResultCache: Send + Sync {
    /// Records that `path` was analyzed and is clean.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be stored.
    fn add_file(&self, path: &str) -> Result<(), CacheError> {
        self.add_file_with_violations(path, &[])
    }

    /// Records the violations found in `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be stored.
    fn add_file_with_violations(&self, path: &str, violations: &[Violation])
        -> Result<(), CacheError>;

    /// Looks up `path`.
    ///
    /// Returns `Ok(None)` when the file was never analyzed (or its entry is
    /// stale), and `Ok(Some(set))` with every violation marked cached
    /// otherwise. An empty set means "analyzed, clean".
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Corrupted`] if the entry cannot be decoded and
    /// [`CacheError::Store`] if the store cannot be read.
    fn has_entry(&self, path: &str) -> Result<Option<ViolationSet>, CacheError>;

    /// Whether lookups can ever hit.
    fn is_enabled(&self) -> bool {
        true
    }
}

/// A cache that encodes entries with a [`PayloadCodec`] into a [`ContentStore`].
#[derive(Debug)]
pub struct StoreCache<S, C> {
    store: S,
    codec: C,
}

impl<S: ContentStore, C: PayloadCodec> StoreCache<S, C> {
    /// Creates a cache over `store` using `codec` for payloads.
    #[must_use]
    pub fn new(store: S, codec: C) -> Self {
        Self { store, codec }
    }

    /// Returns the backing store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: ContentStore, C: PayloadCodec> ResultCache for StoreCache<S, C> {
    fn add_file_with_violations(
        &self,
        path: &str,
        violations: &[Violation],
    ) -> Result<(), CacheError> {
        let key = path::normalize(path);
        let payload = self.codec.encode(violations);
        self.store.store(&key, &payload)?;
        Ok(())
    }

    fn has_entry(&self, path: &str) -> Result<Option<ViolationSet>, CacheError> {
        let key = path::normalize(path);
        let Some(payload) = self.store.get(&key)? else {
            return Ok(None);
        };

        let violations = self
            .codec
            .decode(&payload)
            .map_err(|source| CacheError::Corrupted { key, source })?;

        Ok(Some(
            violations.into_iter().map(Violation::into_cached).collect(),
        ))
    }
}

/// The cache used when incremental mode is off.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCache;

impl ResultCache for NullCache {
    fn add_file_with_violations(&self, _path: &str, _violations: &[Violation]) -> Result<(), CacheError> {
        Ok(())
    }

    fn has_entry(&self, _path: &str) -> Result<Option<ViolationSet>, CacheError> {
        Ok(None)
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{BinaryCodec, JsonCodec};
    use crate::types::ViolationKind;
    use std::sync::Arc;

    fn violations() -> Vec<Violation> {
        vec![
            Violation::new("src/api/h.rs", "db", "src/api", ViolationKind::Prohibited, "no db"),
            Violation::new("src/api/h.rs", "os", "src/api", ViolationKind::NotAllowed, ""),
        ]
    }

    #[test]
    fn hit_forces_cached_flag() {
        let cache = StoreCache::new(MemoryStore::new(), BinaryCodec::new());
        let stored = violations();
        assert!(stored.iter().all(|v| !v.cached));

        cache.add_file_with_violations("src/api/h.rs", &stored).unwrap();
        let hit = cache.has_entry("src/api/h.rs").unwrap().unwrap();

        assert_eq!(hit.len(), 2);
        assert!(hit.iter().all(|v| v.cached));
        let expected: ViolationSet = stored.into_iter().map(Violation::into_cached).collect();
        assert_eq!(hit, expected);
    }

    #[test]
    fn clean_file_differs_from_unknown_file() {
        let cache = StoreCache::new(MemoryStore::new(), BinaryCodec::new());
        cache.add_file("src/clean.rs").unwrap();

        let clean = cache.has_entry("src/clean.rs").unwrap();
        assert!(clean.is_some_and(|set| set.is_empty()));
        assert!(cache.has_entry("src/never.rs").unwrap().is_none());
    }

    #[test]
    fn keys_are_normalized() {
        let cache = StoreCache::new(MemoryStore::new(), BinaryCodec::new());
        cache.add_file("./src/x/../a.rs").unwrap();
        assert!(cache.has_entry("src/a.rs").unwrap().is_some());
    }

    #[test]
    fn corrupted_entry_is_reported() {
        let store = Arc::new(MemoryStore::new());
        store.store("src/a.rs", &[3, 1]).unwrap();

        let cache = StoreCache::new(Arc::clone(&store), BinaryCodec::new());
        let err = cache.has_entry("src/a.rs").unwrap_err();
        assert!(matches!(err, CacheError::Corrupted { ref key, .. } if key == "src/a.rs"));
    }

    #[test]
    fn json_strategy_is_interchangeable() {
        let cache: Box<dyn ResultCache> =
            Box::new(StoreCache::new(MemoryStore::new(), JsonCodec::new()));
        cache.add_file_with_violations("a.rs", &violations()).unwrap();
        assert_eq!(cache.has_entry("a.rs").unwrap().unwrap().len(), 2);
    }

    #[test]
    fn null_cache_never_hits() {
        let cache = NullCache;
        cache.add_file_with_violations("a.rs", &violations()).unwrap();
        assert!(cache.has_entry("a.rs").unwrap().is_none());
        assert!(!cache.is_enabled());
    }
}
