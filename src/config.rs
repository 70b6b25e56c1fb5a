//! Cache configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the bundled [`MemoryStore`](crate::MemoryStore)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of entries, unbounded when `None`
    pub max_capacity: Option<u64>,
    /// Time-to-live applied to every entry
    pub time_to_live: Option<Duration>,
    /// Entries not read for this long are expired
    pub time_to_idle: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: Some(10_000),
            time_to_live: Some(Duration::from_secs(300)), // 5 minutes
            time_to_idle: None,
        }
    }
}

impl CacheConfig {
    /// A configuration without capacity bound or store-wide expiry.
    ///
    /// Entries still honour a per-entry time-to-live set by the factory.
    pub fn unbounded() -> Self {
        Self {
            max_capacity: None,
            time_to_live: None,
            time_to_idle: None,
        }
    }
}
