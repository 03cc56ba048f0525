//! FIFO Strategy Module
//!
//! First-in first-out eviction. Reads never change the order.

use std::time::Duration;

use super::{Counters, EvictionStats, EvictionStrategy, KeyList};

// == FIFO Strategy ==
/// Evicts the oldest still-tracked key by insertion time.
///
/// Overwriting a tracked key keeps its original position in the queue.
#[derive(Debug, Default, Clone)]
pub struct FifoStrategy {
    queue: KeyList,
    counters: Counters,
}

impl FifoStrategy {
    pub const NAME: &'static str = "fifo";

    pub fn new() -> Self {
        Self::default()
    }
}

impl EvictionStrategy for FifoStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn record_access(&mut self, _key: &str) {}

    fn record_add(&mut self, key: &str, _ttl: Option<Duration>) {
        self.queue.push_front(key);
        self.counters.additions += 1;
    }

    fn eviction_key(&mut self) -> Option<String> {
        self.queue.back().map(str::to_string)
    }

    fn remove_key(&mut self, key: &str) {
        if self.queue.remove(key) {
            self.counters.removals += 1;
        }
    }

    fn clear(&mut self) {
        self.queue.clear();
    }

    fn len(&self) -> usize {
        self.queue.len()
    }

    fn stats(&self) -> EvictionStats {
        self.counters.snapshot(Self::NAME, self.queue.len())
    }
}
