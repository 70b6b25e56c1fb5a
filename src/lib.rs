//! pcache-aside - Partitioned cache-aside library
//!
//! This library layers partition semantics on top of an in-memory cache:
//! - Get-or-create by `(partition, key)`, computing values on a miss
//! - Invalidation of a single key, a whole partition, or everything
//! - Sync and async factories, fallible or not
//! - Pluggable store, with a Moka-backed default
//!
//! ```rust
//! use pcache_aside::{CacheConfig, PartitionedCache};
//!
//! let cache = PartitionedCache::with_config(CacheConfig::default());
//!
//! let title: String = cache.get_or_create("post", "42", |_| "Hello".to_owned())?;
//! assert_eq!(title, "Hello");
//!
//! // Drops every entry created under "post"
//! cache.remove_partition("post")?;
//! # Ok::<(), pcache_aside::CacheError>(())
//! ```

mod config;
mod error;
mod memory_store;
mod partition_index;
mod partitioned_cache;
mod store;

pub use config::CacheConfig;
pub use error::CacheError;
pub use memory_store::MemoryStore;
pub use partitioned_cache::{KEY_SEPARATOR, PartitionedCache, composite_key};
pub use store::{CacheEntry, CacheStore, Cacheable};

// Re-export async_trait for store implementors
pub use async_trait::async_trait;
