use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

/// Name-keyed monotonic counters, created on first use.
///
/// Increments of an existing counter only take the read lock, so workers
/// bumping the same counter never serialize on the map.
#[derive(Debug, Default)]
pub struct DebugCounters {
    counters: RwLock<HashMap<&'static str, AtomicU64>>,
}

impl DebugCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self, name: &'static str) {
        self.add(name, 1);
    }

    pub fn add(&self, name: &'static str, delta: u64) {
        if let Some(counter) = self.counters.read().get(name) {
            counter.fetch_add(delta, Ordering::Relaxed);
            return;
        }
        self.counters
            .write()
            .entry(name)
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(delta, Ordering::Relaxed);
    }

    /// Current value, zero for counters never touched
    pub fn get(&self, name: &str) -> u64 {
        self.counters
            .read()
            .get(name)
            .map_or(0, |counter| counter.load(Ordering::Relaxed))
    }

    pub fn snapshot(&self) -> BTreeMap<&'static str, u64> {
        self.counters
            .read()
            .iter()
            .map(|(name, counter)| (*name, counter.load(Ordering::Relaxed)))
            .collect()
    }

    pub fn clear(&self) {
        self.counters.write().clear();
    }
}
