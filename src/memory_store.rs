//! In-memory store backed by Moka
//!
//! Values of any [`Cacheable`] type share one Moka cache: they are stored
//! type-erased and downcast on the way out.

use std::any::{Any, type_name};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::sync::Cache;
use tracing::{debug, warn};

use crate::{CacheConfig, CacheEntry, CacheError, CacheStore, Cacheable};

#[derive(Clone)]
struct StoredValue {
    value: Arc<dyn Any + Send + Sync>,
    time_to_live: Option<Duration>,
    time_to_idle: Option<Duration>,
}

impl StoredValue {
    fn new<V: Cacheable>(value: V, entry: &CacheEntry) -> Self {
        Self {
            value: Arc::new(value),
            time_to_live: entry.time_to_live(),
            time_to_idle: entry.time_to_idle(),
        }
    }

    /// Time left before expiry, `age` after the value was stored
    fn remaining(&self, age: Duration) -> Option<Duration> {
        let ttl_left = self.time_to_live.map(|ttl| ttl.saturating_sub(age));
        match (ttl_left, self.time_to_idle) {
            (Some(ttl_left), Some(tti)) => Some(ttl_left.min(tti)),
            (ttl_left, tti) => ttl_left.or(tti),
        }
    }

    fn downcast<V: Cacheable>(&self, key: &str) -> Result<V, CacheError> {
        match self.value.downcast_ref::<V>() {
            Some(value) => Ok(value.clone()),
            None => {
                warn!(
                    "Cached value for key {} is not of the requested type {}",
                    key,
                    type_name::<V>()
                );
                Err(CacheError::TypeMismatch {
                    key: key.to_owned(),
                    expected: type_name::<V>(),
                })
            }
        }
    }
}

/// Applies the expiry a factory set on its [`CacheEntry`]
struct EntryExpiry;

impl Expiry<String, StoredValue> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &StoredValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        value.remaining(Duration::ZERO)
    }

    fn expire_after_read(
        &self,
        _key: &String,
        value: &StoredValue,
        read_at: Instant,
        duration_until_expiry: Option<Duration>,
        last_modified_at: Instant,
    ) -> Option<Duration> {
        if value.time_to_idle.is_none() {
            return duration_until_expiry;
        }
        value.remaining(read_at.saturating_duration_since(last_modified_at))
    }
}

/// Heterogeneous in-memory cache store.
#[derive(Clone)]
pub struct MemoryStore {
    cache: Cache<String, StoredValue>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl MemoryStore {
    /// Create a new store from the given configuration
    pub fn new(config: CacheConfig) -> Self {
        let mut builder = Cache::<String, StoredValue>::builder().expire_after(EntryExpiry);
        if let Some(max_capacity) = config.max_capacity {
            builder = builder.max_capacity(max_capacity);
        }
        if let Some(ttl) = config.time_to_live {
            builder = builder.time_to_live(ttl);
        }
        if let Some(tti) = config.time_to_idle {
            builder = builder.time_to_idle(tti);
        }

        Self {
            cache: builder.build(),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.cache.contains_key(key)
    }

    /// Number of live entries, after flushing pending maintenance
    pub fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    fn get_or_create<V, E, F>(&self, key: &str, factory: F) -> Result<V, E>
    where
        V: Cacheable,
        E: From<CacheError>,
        F: FnOnce(&mut CacheEntry) -> Result<V, E>,
    {
        let mut failure = None;
        let entry = self.cache.entry_by_ref(key).or_optionally_insert_with(|| {
            let mut cache_entry = CacheEntry::new(key);
            match factory(&mut cache_entry) {
                Ok(value) => Some(StoredValue::new(value, &cache_entry)),
                Err(e) => {
                    failure = Some(e);
                    None
                }
            }
        });

        let Some(entry) = entry else {
            debug!("Factory failed for key: {}", key);
            return Err(failure.unwrap_or_else(|| {
                CacheError::Store(format!("no value was created for key {key}")).into()
            }));
        };

        if entry.is_fresh() {
            debug!("Cache miss - created value for key: {}", key);
        } else {
            debug!("Cache hit for key: {}", key);
        }
        Ok(entry.into_value().downcast(key)?)
    }

    async fn get_or_create_async<V, E, F, Fut>(&self, key: &str, factory: F) -> Result<V, E>
    where
        V: Cacheable,
        E: From<CacheError> + Send,
        F: FnOnce(&mut CacheEntry) -> Fut + Send,
        Fut: Future<Output = Result<V, E>> + Send,
    {
        if let Some(stored) = self.cache.get(key) {
            debug!("Cache hit for key: {}", key);
            return Ok(stored.downcast(key)?);
        }

        let mut cache_entry = CacheEntry::new(key);
        let pending = factory(&mut cache_entry);
        let value = pending.await?;

        // Concurrent misses race here; whichever value landed first wins.
        let entry = self
            .cache
            .entry_by_ref(key)
            .or_insert(StoredValue::new(value, &cache_entry));
        if entry.is_fresh() {
            debug!("Cache miss - created value for key: {}", key);
        } else {
            debug!("Cache miss raced an insert for key: {}", key);
        }
        Ok(entry.into_value().downcast(key)?)
    }

    fn remove(&self, key: &str) {
        self.cache.invalidate(key);
    }
}
