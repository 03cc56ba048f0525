//! LRU Strategy Module
//!
//! Implements Least Recently Used tracking for cache eviction.

use std::time::Duration;

use super::{Counters, EvictionStats, EvictionStrategy, KeyList};

// == LRU Strategy ==
/// Tracks access order for LRU eviction.
///
/// Keys are kept in a linked list where:
/// - Front = Most recently used
/// - Back = Least recently used
///
/// Every operation is O(1).
#[derive(Debug, Default, Clone)]
pub struct LruStrategy {
    order: KeyList,
    counters: Counters,
}

impl LruStrategy {
    pub const NAME: &'static str = "lru";

    pub fn new() -> Self {
        Self::default()
    }

    /// Tracked keys from most to least recently used.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.order.iter()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.order.contains(key)
    }
}

impl EvictionStrategy for LruStrategy {
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
        self.order.back().map(str::to_string)
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
