//! Partitioned cache-aside facade
//!
//! Wraps a [`CacheStore`] and remembers which keys were requested under which
//! partition, so that a whole partition (or everything) can be invalidated
//! without scanning the store.
//!
//! Values are filed in the store under `"{partition}-{key}"`. Keys or
//! partitions that themselves contain `-` can collide (`"a"`/`"b-c"` and
//! `"a-b"`/`"c"` map to the same flat key).

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::future::{self, Either};
use tracing::debug;

use crate::partition_index::PartitionIndex;
use crate::{CacheConfig, CacheEntry, CacheError, CacheStore, Cacheable, MemoryStore};

/// Separator between partition and key in the flat store key
pub const KEY_SEPARATOR: char = '-';

/// Build the flat key a `(partition, key)` pair is stored under
pub fn composite_key(partition: &str, key: &str) -> String {
    format!("{partition}{KEY_SEPARATOR}{key}")
}

fn ensure_not_blank(name: &'static str, value: &str) -> Result<(), CacheError> {
    if value.trim().is_empty() {
        return Err(CacheError::blank(name));
    }
    Ok(())
}

/// Key argument of the get-or-create family; `None` or blank means "nothing to cache"
fn usable_key(key: Option<&str>) -> Option<&str> {
    key.filter(|k| !k.trim().is_empty())
}

struct PartitionedCacheInner<S: CacheStore> {
    store: Arc<S>,
    index: PartitionIndex,
    disposed: AtomicBool,
}

impl<S: CacheStore> PartitionedCacheInner<S> {
    fn ensure_live(&self) -> Result<(), CacheError> {
        if self.disposed.load(Ordering::Acquire) {
            return Err(CacheError::ObjectDisposed);
        }
        Ok(())
    }

    fn clear_all(&self) {
        let partitions = self.index.take_all();
        let partition_count = partitions.len();
        let removed: usize = partitions
            .into_iter()
            .map(|(partition, keys)| self.remove_keys(&partition, keys))
            .sum();
        debug!(
            "Cleared {} keys across {} partitions",
            removed, partition_count
        );
    }

    /// Remove each distinct key of `partition` from the store once.
    fn remove_keys(&self, partition: &str, mut keys: Vec<String>) -> usize {
        keys.sort_unstable();
        keys.dedup();
        for key in &keys {
            self.store.remove(&composite_key(partition, key));
        }
        keys.len()
    }

    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.clear_all();
        debug!("Partitioned cache disposed");
    }
}

impl<S: CacheStore> Drop for PartitionedCacheInner<S> {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Cache-aside facade with partition-level invalidation.
///
/// Clones share the same index and store. The facade is disposed when
/// [`dispose`](Self::dispose) is called or the last clone is dropped;
/// disposal first clears every entry the facade created.
pub struct PartitionedCache<S: CacheStore = MemoryStore> {
    inner: Arc<PartitionedCacheInner<S>>,
}

impl<S: CacheStore> Clone for PartitionedCache<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl PartitionedCache<MemoryStore> {
    /// Create a facade over a fresh [`MemoryStore`]
    pub fn with_config(config: CacheConfig) -> Self {
        Self::new(Arc::new(MemoryStore::new(config)))
    }
}

impl Default for PartitionedCache<MemoryStore> {
    fn default() -> Self {
        Self::with_config(CacheConfig::default())
    }
}

impl<S: CacheStore> PartitionedCache<S> {
    /// Create a facade over a shared store
    pub fn new(store: Arc<S>) -> Self {
        Self {
            inner: Arc::new(PartitionedCacheInner {
                store,
                index: PartitionIndex::default(),
                disposed: AtomicBool::new(false),
            }),
        }
    }

    /// The store this facade delegates to
    pub fn store(&self) -> &Arc<S> {
        &self.inner.store
    }

    /// Validate the arguments and register the pair.
    ///
    /// Returns `None` when the key is missing or blank and nothing should be
    /// cached.
    fn prepare(&self, partition: &str, key: Option<&str>) -> Result<Option<String>, CacheError> {
        ensure_not_blank("partition", partition)?;
        let Some(key) = usable_key(key) else {
            debug!("Skipping cache for blank key in partition {}", partition);
            return Ok(None);
        };
        self.inner.ensure_live()?;

        self.inner.index.register(partition, key);
        Ok(Some(composite_key(partition, key)))
    }

    /// Get the value for `(partition, key)`, computing it with `factory` on a miss.
    ///
    /// A missing or blank `key` returns `V::default()` without calling the
    /// factory. The pair is registered under `partition` on every call.
    pub fn get_or_create<'k, V, F>(
        &self,
        partition: &str,
        key: impl Into<Option<&'k str>>,
        factory: F,
    ) -> Result<V, CacheError>
    where
        V: Cacheable + Default,
        F: FnOnce(&mut CacheEntry) -> V,
    {
        self.try_get_or_create(partition, key, |entry| Ok(factory(entry)))
    }

    /// Like [`get_or_create`](Self::get_or_create) with a fallible factory.
    ///
    /// The factory's error is returned unchanged and nothing is stored.
    pub fn try_get_or_create<'k, V, E, F>(
        &self,
        partition: &str,
        key: impl Into<Option<&'k str>>,
        factory: F,
    ) -> Result<V, E>
    where
        V: Cacheable + Default,
        E: From<CacheError>,
        F: FnOnce(&mut CacheEntry) -> Result<V, E>,
    {
        match self.prepare(partition, key.into())? {
            Some(flat_key) => self.inner.store.get_or_create(&flat_key, factory),
            None => Ok(V::default()),
        }
    }

    /// Async variant of [`get_or_create`](Self::get_or_create).
    ///
    /// Arguments are checked and the pair registered when this is called, not
    /// when the future is first polled; a rejected call yields a future that
    /// is already failed.
    pub fn get_or_create_async<'a, 'k, V, F, Fut>(
        &'a self,
        partition: &str,
        key: impl Into<Option<&'k str>>,
        factory: F,
    ) -> impl Future<Output = Result<V, CacheError>> + Send + 'a
    where
        V: Cacheable + Default,
        F: FnOnce(&mut CacheEntry) -> Fut + Send + 'a,
        Fut: Future<Output = V> + Send + 'a,
    {
        self.try_get_or_create_async(partition, key, move |entry| {
            let pending = factory(entry);
            async move { Ok::<V, CacheError>(pending.await) }
        })
    }

    /// Async variant of [`try_get_or_create`](Self::try_get_or_create).
    ///
    /// The factory and its future may borrow from the caller for as long as
    /// the returned future lives.
    pub fn try_get_or_create_async<'a, 'k, V, E, F, Fut>(
        &'a self,
        partition: &str,
        key: impl Into<Option<&'k str>>,
        factory: F,
    ) -> impl Future<Output = Result<V, E>> + Send + 'a
    where
        V: Cacheable + Default,
        E: From<CacheError> + Send + 'a,
        F: FnOnce(&mut CacheEntry) -> Fut + Send + 'a,
        Fut: Future<Output = Result<V, E>> + Send + 'a,
    {
        match self.prepare(partition, key.into()) {
            Ok(Some(flat_key)) => {
                let store = &self.inner.store;
                Either::Right(async move { store.get_or_create_async(&flat_key, factory).await })
            }
            Ok(None) => Either::Left(future::ready(Ok(V::default()))),
            Err(e) => Either::Left(future::ready(Err(E::from(e)))),
        }
    }

    /// Remove every entry created through this facade and empty the index.
    pub fn clear(&self) -> Result<(), CacheError> {
        self.inner.ensure_live()?;
        self.inner.clear_all();
        Ok(())
    }

    /// Remove every entry registered under `partition`.
    ///
    /// Unknown partitions are ignored.
    pub fn remove_partition(&self, partition: &str) -> Result<(), CacheError> {
        ensure_not_blank("partition", partition)?;
        self.inner.ensure_live()?;

        let Some(keys) = self.inner.index.take_partition(partition) else {
            return Ok(());
        };
        let removed = self.inner.remove_keys(partition, keys);
        debug!("Removed partition {} ({} keys)", partition, removed);
        Ok(())
    }

    /// Remove the single entry for `(partition, key)`.
    ///
    /// The key stays listed under its partition until the partition or the
    /// whole cache is cleared.
    pub fn remove(&self, partition: &str, key: &str) -> Result<(), CacheError> {
        ensure_not_blank("partition", partition)?;
        ensure_not_blank("key", key)?;
        self.inner.ensure_live()?;

        let flat_key = composite_key(partition, key);
        debug!("Removing cache key {}", flat_key);
        self.inner.store.remove(&flat_key);
        Ok(())
    }

    /// Clear the cache and refuse all further operations. Idempotent.
    pub fn dispose(&self) {
        self.inner.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }

    /// Snapshot of the partitions currently tracked
    pub fn partitions(&self) -> Vec<String> {
        self.inner.index.partitions()
    }

    /// Snapshot of the keys tracked under `partition`, duplicates included
    pub fn keys(&self, partition: &str) -> Option<Vec<String>> {
        self.inner.index.keys(partition)
    }

    pub fn contains_partition(&self, partition: &str) -> bool {
        self.inner.index.contains_partition(partition)
    }

    /// Total number of keys tracked across all partitions
    pub fn tracked_key_count(&self) -> usize {
        self.inner.index.tracked_key_count()
    }
}
