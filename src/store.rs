//! Contract for the cache store the partitioned layer decorates.
//!
//! The store owns storage, expiration and eviction. The partitioned layer only
//! hands it flat (composite) keys and factories, and asks it to drop keys.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::CacheError;

/// Trait for types that can be cached
pub trait Cacheable: Clone + Send + Sync + 'static {}
impl<T> Cacheable for T where T: Clone + Send + Sync + 'static {}

/// The entry a factory is populating.
///
/// Handed to every factory so it can see the flat key being created and
/// tune how long the entry lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    key: String,
    time_to_live: Option<Duration>,
    time_to_idle: Option<Duration>,
}

impl CacheEntry {
    /// A fresh entry for `key` with no expiry of its own
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            time_to_live: None,
            time_to_idle: None,
        }
    }

    /// The flat key the store will file the value under
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Expire this entry after `ttl`, on top of any store-wide expiry
    pub fn set_time_to_live(&mut self, ttl: Duration) -> &mut Self {
        self.time_to_live = Some(ttl);
        self
    }

    pub fn time_to_live(&self) -> Option<Duration> {
        self.time_to_live
    }

    /// Expire this entry once it has not been read for `tti`.
    ///
    /// Reads push the deadline back, but never past the entry's own
    /// time-to-live.
    pub fn set_time_to_idle(&mut self, tti: Duration) -> &mut Self {
        self.time_to_idle = Some(tti);
        self
    }

    pub fn time_to_idle(&self) -> Option<Duration> {
        self.time_to_idle
    }
}

/// Trait for the underlying key/value store.
///
/// Implementations must be safe to call concurrently. `get_or_create` is
/// expected to be atomic per key; the async variant may let concurrent
/// misses race, as long as a single value ends up stored.
#[async_trait]
pub trait CacheStore: Send + Sync + 'static {
    /// Return the value stored under `key`, or run `factory` and store its
    /// result.
    ///
    /// A failing factory stores nothing and its error is returned as is.
    fn get_or_create<V, E, F>(&self, key: &str, factory: F) -> Result<V, E>
    where
        V: Cacheable,
        E: From<CacheError>,
        F: FnOnce(&mut CacheEntry) -> Result<V, E>;

    /// Async counterpart of [`CacheStore::get_or_create`].
    async fn get_or_create_async<V, E, F, Fut>(&self, key: &str, factory: F) -> Result<V, E>
    where
        V: Cacheable,
        E: From<CacheError> + Send,
        F: FnOnce(&mut CacheEntry) -> Fut + Send,
        Fut: Future<Output = Result<V, E>> + Send;

    /// Drop whatever is stored under `key`. Absent keys are ignored.
    fn remove(&self, key: &str);
}
