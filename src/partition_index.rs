//! Side index of partition name -> keys registered under it.
//!
//! Key collections are append-only: keys are never pruned individually, only
//! dropped together with their partition. Duplicates are kept.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};

type Partitions = DashMap<String, Mutex<Vec<String>>>;

#[derive(Default)]
pub(crate) struct PartitionIndex {
    /// Swapped out wholesale on clear; everything else works on a snapshot.
    partitions: RwLock<Arc<Partitions>>,
}

impl PartitionIndex {
    fn current(&self) -> Arc<Partitions> {
        Arc::clone(&self.partitions.read())
    }

    /// Record `key` under `partition`, creating the partition on first use.
    pub(crate) fn register(&self, partition: &str, key: &str) {
        let partitions = self.current();
        if let Some(keys) = partitions.get(partition) {
            keys.lock().push(key.to_owned());
            return;
        }
        partitions
            .entry(partition.to_owned())
            .or_default()
            .lock()
            .push(key.to_owned());
    }

    /// Detach `partition` and return the keys recorded under it.
    pub(crate) fn take_partition(&self, partition: &str) -> Option<Vec<String>> {
        self.current()
            .remove(partition)
            .map(|(_, keys)| keys.into_inner())
    }

    /// Replace the whole index with an empty one, returning what it held.
    pub(crate) fn take_all(&self) -> Vec<(String, Vec<String>)> {
        let previous = std::mem::take(&mut *self.partitions.write());
        previous
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().lock().clone()))
            .collect()
    }

    pub(crate) fn partitions(&self) -> Vec<String> {
        self.current()
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub(crate) fn keys(&self, partition: &str) -> Option<Vec<String>> {
        self.current()
            .get(partition)
            .map(|keys| keys.lock().clone())
    }

    pub(crate) fn contains_partition(&self, partition: &str) -> bool {
        self.current().contains_key(partition)
    }

    pub(crate) fn tracked_key_count(&self) -> usize {
        self.current()
            .iter()
            .map(|entry| entry.value().lock().len())
            .sum()
    }
}
