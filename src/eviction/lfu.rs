//! LFU Strategy Module
//!
//! Least Frequently Used eviction with oldest-access tie-break.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use super::{Counters, EvictionStats, EvictionStrategy};

#[derive(Debug, Clone, Copy)]
struct Record {
    frequency: u64,
    last_access: u64,
}

// == LFU Strategy ==
/// Evicts the key with the lowest access count; among equals, the one touched longest ago.
///
/// Ordering lives in a `BTreeSet` of `(frequency, last_access, key)`, so every
/// operation is O(log n).
#[derive(Debug, Default, Clone)]
pub struct LfuStrategy {
    records: HashMap<String, Record>,
    order: BTreeSet<(u64, u64, String)>,
    tick: u64,
    counters: Counters,
}

impl LfuStrategy {
    pub const NAME: &'static str = "lfu";

    pub fn new() -> Self {
        Self::default()
    }

    /// Access count of a tracked key. A freshly added key has frequency 1.
    pub fn frequency(&self, key: &str) -> Option<u64> {
        self.records.get(key).map(|r| r.frequency)
    }

    fn bump(&mut self, key: &str) -> bool {
        self.tick += 1;
        let Some(record) = self.records.get_mut(key) else {
            return false;
        };
        self.order
            .remove(&(record.frequency, record.last_access, key.to_string()));
        record.frequency += 1;
        record.last_access = self.tick;
        self.order
            .insert((record.frequency, record.last_access, key.to_string()));
        true
    }
}

impl EvictionStrategy for LfuStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn record_access(&mut self, key: &str) {
        if self.bump(key) {
            self.counters.accesses += 1;
        }
    }

    fn record_add(&mut self, key: &str, _ttl: Option<Duration>) {
        self.counters.additions += 1;
        if self.bump(key) {
            return;
        }
        let record = Record {
            frequency: 1,
            last_access: self.tick,
        };
        self.order
            .insert((record.frequency, record.last_access, key.to_string()));
        self.records.insert(key.to_string(), record);
    }

    fn eviction_key(&mut self) -> Option<String> {
        self.order.first().map(|(_, _, key)| key.clone())
    }

    fn remove_key(&mut self, key: &str) {
        if let Some(record) = self.records.remove(key) {
            self.order
                .remove(&(record.frequency, record.last_access, key.to_string()));
            self.counters.removals += 1;
        }
    }

    fn clear(&mut self) {
        self.records.clear();
        self.order.clear();
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn stats(&self) -> EvictionStats {
        self.counters.snapshot(Self::NAME, self.records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lfu_lowest_frequency_wins() {
        let mut lfu = LfuStrategy::new();
        for key in ["a", "b", "c"] {
            lfu.record_add(key, None);
        }
        // a:3, b:1, c:2
        lfu.record_access("a");
        lfu.record_access("a");
        lfu.record_access("c");

        assert_eq!(lfu.frequency("a"), Some(3));
        assert_eq!(lfu.frequency("b"), Some(1));
        assert_eq!(lfu.frequency("c"), Some(2));
        assert_eq!(lfu.eviction_key(), Some("b".to_string()));
    }

    #[test]
    fn test_lfu_tie_breaks_on_oldest_access() {
        let mut lfu = LfuStrategy::new();
        lfu.record_add("a", None);
        lfu.record_add("b", None);
        lfu.record_access("b");
        lfu.record_access("a");

        // both at 2, b touched earlier
        assert_eq!(lfu.eviction_key(), Some("b".to_string()));
    }

    #[test]
    fn test_lfu_readd_counts_as_access() {
        let mut lfu = LfuStrategy::new();
        lfu.record_add("a", None);
        lfu.record_add("a", None);

        assert_eq!(lfu.len(), 1);
        assert_eq!(lfu.frequency("a"), Some(2));
    }

    #[test]
    fn test_lfu_remove_and_unknown() {
        let mut lfu = LfuStrategy::new();
        lfu.record_add("a", None);
        lfu.record_add("b", None);

        lfu.record_access("ghost");
        lfu.remove_key("ghost");
        lfu.remove_key("a");

        assert_eq!(lfu.eviction_key(), Some("b".to_string()));
        assert_eq!(lfu.frequency("a"), None);
        assert_eq!(lfu.stats().removals, 1);
    }

    #[test]
    fn test_lfu_clear() {
        let mut lfu = LfuStrategy::new();
        lfu.record_add("a", None);
        lfu.clear();
        assert!(lfu.is_empty());
        assert_eq!(lfu.eviction_key(), None);
    }
}
