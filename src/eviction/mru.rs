//! MRU Strategy Module
//!
//! Most Recently Used eviction: the mirror image of LRU.

use std::time::Duration;

use super::{Counters, EvictionStats, EvictionStrategy, KeyList};

// == MRU Strategy ==
/// Evicts the key touched last. Useful for cyclic scans larger than the cache.
#[derive(Debug, Default, Clone)]
pub struct MruStrategy {
    order: KeyList,
    counters: Counters,
}

impl MruStrategy {
    pub const NAME: &'static str = "mru";

    pub fn new() -> Self {
        Self::default()
    }
}

impl EvictionStrategy for MruStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn record_access(&mut self, key: &str) {
        if self.order.move_to_front(key) {
            self.counters.accesses += 1;
        }
    }

    fn record_add(&mut self, key: &str, _ttl: Option<Duration>) {
        if !self.order.move_to_front(key) {
            self.order.push_front(key);
        }
        self.counters.additions += 1;
    }

    fn eviction_key(&mut self) -> Option<String> {
        self.order.front().map(str::to_string)
    }

    fn remove_key(&mut self, key: &str) {
        if self.order.remove(key) {
            self.counters.removals += 1;
        }
    }

    fn clear(&mut self) {
        self.order.clear();
    }

    fn len(&self) -> usize {
        self.order.len()
    }

    fn stats(&self) -> EvictionStats {
        self.counters.snapshot(Self::NAME, self.order.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mru_evicts_latest_insert() {
        let mut mru = MruStrategy::new();
        mru.record_add("a", None);
        mru.record_add("b", None);
        mru.record_add("c", None);

        assert_eq!(mru.eviction_key(), Some("c".to_string()));
    }

    #[test]
    fn test_mru_evicts_latest_access() {
        let mut mru = MruStrategy::new();
        mru.record_add("a", None);
        mru.record_add("b", None);
        mru.record_access("a");

        assert_eq!(mru.eviction_key(), Some("a".to_string()));

        mru.remove_key("a");
        assert_eq!(mru.eviction_key(), Some("b".to_string()));
    }

    #[test]
    fn test_mru_empty() {
        let mut mru = MruStrategy::new();
        mru.record_access("ghost");
        assert_eq!(mru.eviction_key(), None);
    }
}
