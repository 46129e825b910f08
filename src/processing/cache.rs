//! Bounded in-memory cache of generated summaries.

use sha2::{Digest, Sha256};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;

/// Compute the cache key for a summary request.
pub(crate) fn summary_key(language: &str, source_text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(language.as_bytes());
    hasher.update(b"\n");
    hasher.update(source_text.trim().as_bytes());
    hex::encode(hasher.finalize())
}

/// Least-recently-used map from request key to summary text.
///
/// A capacity of zero disables caching entirely.
pub(crate) struct SummaryCache {
    inner: Option<Mutex<LruCache<String, String>>>,
}

impl SummaryCache {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            inner: NonZeroUsize::new(capacity).map(|capacity| Mutex::new(LruCache::new(capacity))),
        }
    }

    pub(crate) fn get(&self, key: &str) -> Option<String> {
        let inner = self.inner.as_ref()?;
        let mut cache = inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        cache.get(key).cloned()
    }

    pub(crate) fn insert(&self, key: String, summary: String) {
        let Some(inner) = self.inner.as_ref() else {
            return;
        };
        let mut cache = inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        cache.put(key, summary);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.as_ref().map_or(0, |inner| {
            inner
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .len()
        })
    }
}
