//! Decision Cache Module
//!
//! Bounded LRU memo of engine decisions keyed by fingerprint.

use std::collections::HashMap;

use serde::Serialize;

use super::{Fingerprint, StrategyDecision};
use crate::eviction::{EvictionStrategy, LruStrategy};

// == Decision Cache Stats ==
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DecisionCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
    pub capacity: usize,
}

// == Decision Cache ==
/// Recency order comes from an `LruStrategy` shadowing the stored fingerprints.
#[derive(Debug)]
pub struct DecisionCache {
    capacity: usize,
    decisions: HashMap<String, StrategyDecision>,
    order: LruStrategy,
    hits: u64,
    misses: u64,
}

impl DecisionCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            decisions: HashMap::new(),
            order: LruStrategy::new(),
            hits: 0,
            misses: 0,
        }
    }

    pub fn get(&mut self, fingerprint: &Fingerprint) -> Option<StrategyDecision> {
        let key = fingerprint.to_string();
        match self.decisions.get(&key) {
            Some(decision) => {
                self.hits += 1;
                self.order.record_access(&key);
                Some(decision.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, fingerprint: &Fingerprint, decision: StrategyDecision) {
        if self.capacity == 0 {
            return;
        }
        let key = fingerprint.to_string();
        if !self.decisions.contains_key(&key) {
            while self.decisions.len() >= self.capacity {
                let Some(victim) = self.order.eviction_key() else {
                    break;
                };
                self.order.remove_key(&victim);
                self.decisions.remove(&victim);
            }
        }
        self.order.record_add(&key, None);
        self.decisions.insert(key, decision);
    }

    pub fn clear(&mut self) {
        self.decisions.clear();
        self.order.clear();
    }

    pub fn stats(&self) -> DecisionCacheStats {
        DecisionCacheStats {
            hits: self.hits,
            misses: self.misses,
            size: self.decisions.len(),
            capacity: self.capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineKind;
    use crate::selector::{DataType, SizeBucket, TtlBucket};

    fn fp(data_type: DataType) -> Fingerprint {
        Fingerprint::new(SizeBucket::Tiny, TtlBucket::None, data_type)
    }

    fn decision(engine: EngineKind) -> StrategyDecision {
        StrategyDecision {
            engine,
            reason: "test".to_string(),
        }
    }

    #[test]
    fn test_decision_cache_hit_and_miss() {
        let mut cache = DecisionCache::new(4);
        assert!(cache.get(&fp(DataType::Json)).is_none());

        cache.insert(&fp(DataType::Json), decision(EngineKind::Local));
        assert_eq!(
            cache.get(&fp(DataType::Json)).map(|d| d.engine),
            Some(EngineKind::Local)
        );

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.size), (1, 1, 1));
    }

    #[test]
    fn test_decision_cache_evicts_least_recent() {
        let mut cache = DecisionCache::new(2);
        cache.insert(&fp(DataType::Json), decision(EngineKind::Local));
        cache.insert(&fp(DataType::Text), decision(EngineKind::Memory));
        cache.get(&fp(DataType::Json));
        cache.insert(&fp(DataType::Number), decision(EngineKind::Cookie));

        assert_eq!(cache.stats().size, 2);
        assert!(cache.get(&fp(DataType::Text)).is_none());
        assert!(cache.get(&fp(DataType::Json)).is_some());
        assert!(cache.get(&fp(DataType::Number)).is_some());
    }

    #[test]
    fn test_decision_cache_zero_capacity() {
        let mut cache = DecisionCache::new(0);
        cache.insert(&fp(DataType::Json), decision(EngineKind::Local));
        assert!(cache.get(&fp(DataType::Json)).is_none());
        assert_eq!(cache.stats().size, 0);
    }
}
