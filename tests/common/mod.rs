//! Shared test helpers.

#![allow(dead_code)]

use std::future::Future;
use std::sync::Mutex;

use pcache_aside::{
    CacheConfig, CacheEntry, CacheError, CacheStore, Cacheable, MemoryStore, async_trait,
};

/// Memory store that records every key it is asked to remove.
pub struct RecordingStore {
    inner: MemoryStore,
    removed: Mutex<Vec<String>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(CacheConfig::unbounded()),
            removed: Mutex::new(Vec::new()),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    /// Keys removed so far, sorted
    pub fn removed(&self) -> Vec<String> {
        let mut removed = self.removed.lock().unwrap().clone();
        removed.sort();
        removed
    }

    pub fn removal_count(&self, key: &str) -> usize {
        self.removed
            .lock()
            .unwrap()
            .iter()
            .filter(|k| k.as_str() == key)
            .count()
    }
}

#[async_trait]
impl CacheStore for RecordingStore {
    fn get_or_create<V, E, F>(&self, key: &str, factory: F) -> Result<V, E>
    where
        V: Cacheable,
        E: From<CacheError>,
        F: FnOnce(&mut CacheEntry) -> Result<V, E>,
    {
        self.inner.get_or_create(key, factory)
    }

    async fn get_or_create_async<V, E, F, Fut>(&self, key: &str, factory: F) -> Result<V, E>
    where
        V: Cacheable,
        E: From<CacheError> + Send,
        F: FnOnce(&mut CacheEntry) -> Fut + Send,
        Fut: Future<Output = Result<V, E>> + Send,
    {
        self.inner.get_or_create_async(key, factory).await
    }

    fn remove(&self, key: &str) {
        self.removed.lock().unwrap().push(key.to_owned());
        self.inner.remove(key);
    }
}
