//! Eviction Module
//!
//! Interchangeable policies that nominate a victim key under capacity pressure.
//!
//! Strategies hold no values. They shadow the set of keys resident in the engine
//! that owns them, and the engine keeps the two in sync: every admitted key is
//! reported through `record_add`, every removal through `remove_key`.

mod arc;
mod factory;
mod fifo;
mod lfu;
mod list;
mod lru;
mod mru;
mod random;
mod ttl;

use std::fmt::Debug;
use std::time::Duration;

use serde::Serialize;

pub use arc::{ArcStrategy, DEFAULT_ARC_STEP};
pub use factory::{EvictionStrategyFactory, StrategyConstructor};
pub use fifo::FifoStrategy;
pub use lfu::LfuStrategy;
pub use list::KeyList;
pub use lru::LruStrategy;
pub use mru::MruStrategy;
pub use random::RandomStrategy;
pub use ttl::TtlStrategy;

// == Eviction Strategy ==
/// Policy deciding which resident key to remove under capacity pressure.
///
/// All operations are synchronous and treat unknown keys as a no-op.
pub trait EvictionStrategy: Send + Sync + Debug {
    /// Registered name of this policy.
    fn name(&self) -> &str;

    /// A tracked key was read.
    fn record_access(&mut self, key: &str);

    /// A key was written, optionally with a TTL.
    fn record_add(&mut self, key: &str, ttl: Option<Duration>);

    /// Nominates a victim without removing it. The caller commits with `remove_key`.
    fn eviction_key(&mut self) -> Option<String>;

    fn remove_key(&mut self, key: &str);

    fn clear(&mut self);

    /// Number of tracked keys.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn stats(&self) -> EvictionStats;
}

// == Eviction Stats ==
/// Diagnostic snapshot of a strategy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvictionStats {
    pub strategy: String,
    pub tracked_keys: usize,
    pub accesses: u64,
    pub additions: u64,
    pub removals: u64,
    /// Current LRU blend weight, for adaptive strategies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lru_weight: Option<f64>,
}

/// Operation counters shared by the built-in strategies.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Counters {
    pub accesses: u64,
    pub additions: u64,
    pub removals: u64,
}

impl Counters {
    pub fn snapshot(&self, strategy: &str, tracked_keys: usize) -> EvictionStats {
        EvictionStats {
            strategy: strategy.to_string(),
            tracked_keys,
            accesses: self.accesses,
            additions: self.additions,
            removals: self.removals,
            lru_weight: None,
        }
    }
}
