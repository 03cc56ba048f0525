//! Adaptive Strategy Module
//!
//! Blends LRU and LFU, shifting toward whichever one explains recent hits.

use std::time::Duration;

use super::{Counters, EvictionStats, EvictionStrategy, LfuStrategy, LruStrategy};

/// Default weight shift per observed hit.
pub const DEFAULT_ARC_STEP: f64 = 0.05;

// == ARC Strategy ==
/// Adaptive replacement over an LRU and an LFU shadow index.
///
/// A hit on a key read for the first time since it was written is a recency
/// hit and moves the weight toward LRU; a hit on a key already read before is a
/// frequency hit and moves it toward LFU. The victim comes from LRU while
/// `lru_weight >= 0.5`, from LFU otherwise.
#[derive(Debug, Clone)]
pub struct ArcStrategy {
    lru: LruStrategy,
    lfu: LfuStrategy,
    lru_weight: f64,
    step: f64,
    recency_hits: u64,
    frequency_hits: u64,
    counters: Counters,
}

impl Default for ArcStrategy {
    fn default() -> Self {
        Self::with_step(DEFAULT_ARC_STEP)
    }
}

impl ArcStrategy {
    pub const NAME: &'static str = "arc";

    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `step` as the weight shift per hit, clamped to `[0, 1]`.
    pub fn with_step(step: f64) -> Self {
        Self {
            lru: LruStrategy::new(),
            lfu: LfuStrategy::new(),
            lru_weight: 0.5,
            step: step.clamp(0.0, 1.0),
            recency_hits: 0,
            frequency_hits: 0,
            counters: Counters::default(),
        }
    }

    /// Current LRU weight in `[0, 1]`. LFU weight is the complement.
    pub fn lru_weight(&self) -> f64 {
        self.lru_weight
    }

    pub fn recency_hits(&self) -> u64 {
        self.recency_hits
    }

    pub fn frequency_hits(&self) -> u64 {
        self.frequency_hits
    }
}

impl EvictionStrategy for ArcStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn record_access(&mut self, key: &str) {
        match self.lfu.frequency(key) {
            None => return,
            Some(1) => {
                self.recency_hits += 1;
                self.lru_weight = (self.lru_weight + self.step).min(1.0);
            }
            Some(_) => {
                self.frequency_hits += 1;
                self.lru_weight = (self.lru_weight - self.step).max(0.0);
            }
        }
        self.lru.record_access(key);
        self.lfu.record_access(key);
        self.counters.accesses += 1;
    }

    fn record_add(&mut self, key: &str, ttl: Option<Duration>) {
        self.lru.record_add(key, ttl);
        self.lfu.record_add(key, ttl);
        self.counters.additions += 1;
    }

    fn eviction_key(&mut self) -> Option<String> {
        if self.lru_weight >= 0.5 {
            self.lru.eviction_key()
        } else {
            self.lfu.eviction_key()
        }
    }

    fn remove_key(&mut self, key: &str) {
        if self.lru.contains(key) {
            self.counters.removals += 1;
        }
        self.lru.remove_key(key);
        self.lfu.remove_key(key);
    }

    fn clear(&mut self) {
        self.lru.clear();
        self.lfu.clear();
        self.lru_weight = 0.5;
    }

    fn len(&self) -> usize {
        self.lru.len()
    }

    fn stats(&self) -> EvictionStats {
        let mut stats = self.counters.snapshot(Self::NAME, self.lru.len());
        stats.lru_weight = Some(self.lru_weight);
        stats
    }
}
