//! Random Strategy Module
//!
//! Uniform random victim selection.

use std::collections::HashMap;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{Counters, EvictionStats, EvictionStrategy};

// == Random Strategy ==
/// Evicts a uniformly random tracked key.
///
/// Keys live in a dense vector with a position map so removal is an O(1) swap-remove.
#[derive(Debug, Clone)]
pub struct RandomStrategy {
    keys: Vec<String>,
    positions: HashMap<String, usize>,
    rng: StdRng,
    counters: Counters,
}

impl Default for RandomStrategy {
    fn default() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }
}

impl RandomStrategy {
    pub const NAME: &'static str = "random";

    pub fn new() -> Self {
        Self::default()
    }

    /// Reproducible victim sequence.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            keys: Vec::new(),
            positions: HashMap::new(),
            rng,
            counters: Counters::default(),
        }
    }
}

impl EvictionStrategy for RandomStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn record_access(&mut self, key: &str) {
        if self.positions.contains_key(key) {
            self.counters.accesses += 1;
        }
    }

    fn record_add(&mut self, key: &str, _ttl: Option<Duration>) {
        self.counters.additions += 1;
        if self.positions.contains_key(key) {
            return;
        }
        self.positions.insert(key.to_string(), self.keys.len());
        self.keys.push(key.to_string());
    }

    fn eviction_key(&mut self) -> Option<String> {
        if self.keys.is_empty() {
            return None;
        }
        let idx = self.rng.gen_range(0..self.keys.len());
        Some(self.keys[idx].clone())
    }

    fn remove_key(&mut self, key: &str) {
        let Some(idx) = self.positions.remove(key) else {
            return;
        };
        self.keys.swap_remove(idx);
        if let Some(moved) = self.keys.get(idx) {
            self.positions.insert(moved.clone(), idx);
        }
        self.counters.removals += 1;
    }

    fn clear(&mut self) {
        self.keys.clear();
        self.positions.clear();
    }

    fn len(&self) -> usize {
        self.keys.len()
    }

    fn stats(&self) -> EvictionStats {
        self.counters.snapshot(Self::NAME, self.keys.len())
    }
}
