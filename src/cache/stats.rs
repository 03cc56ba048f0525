//! Cache Statistics Module
//!
//! Tracks façade-level metrics: hits, misses, writes, deletes and rejected writes.
//! Evictions and expirations are counted per engine and folded in on read.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// Number of admitted writes
    pub writes: u64,
    /// Number of writes rejected by an engine
    pub rejected_writes: u64,
    /// Number of explicit removals that found a key
    pub deletes: u64,
    /// Entries evicted under capacity pressure, across engines
    pub evictions: u64,
    /// Entries dropped because their TTL elapsed, across engines
    pub expirations: u64,
    /// Current number of entries across engines
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_write(&mut self) {
        self.writes += 1;
    }

    pub fn record_rejected_write(&mut self) {
        self.rejected_writes += 1;
    }

    pub fn record_delete(&mut self) {
        self.deletes += 1;
    }
}
