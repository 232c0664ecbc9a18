use parking_lot::Mutex;

use crate::cache::{ByteView, LruCache};

/// The group's concurrency-safe wrapper around the LRU store.
///
/// The mutex is held only for the duration of a single store operation,
/// never across a loader call or any other await point.
pub(crate) struct MainCache {
    inner: Mutex<LruCache>,
}

impl MainCache {
    pub(crate) fn new(cache_bytes: i64) -> Self {
        Self {
            inner: Mutex::new(LruCache::new(cache_bytes, None)),
        }
    }

    pub(crate) fn add(&self, key: &str, value: ByteView) {
        self.inner.lock().add(key, value);
    }

    pub(crate) fn get(&self, key: &str) -> Option<ByteView> {
        self.inner.lock().get(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub(crate) fn used_bytes(&self) -> i64 {
        self.inner.lock().used_bytes()
    }
}
