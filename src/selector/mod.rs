//! Engine Selector Module
//!
//! Decides which storage engine should own a write.
//!
//! Selection is deterministic: for a fixed configuration and available set,
//! the same fingerprint always yields the same decision, so decisions are
//! memoized per fingerprint in a bounded LRU cache.

mod config;
mod decision_cache;
mod fingerprint;

use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::engine::EngineKind;
use crate::error::{CacheError, Result};

pub use config::{EngineProfile, ScoreWeights, SelectorConfig, Thresholds};
pub use decision_cache::{DecisionCache, DecisionCacheStats};
pub use fingerprint::{DataType, Fingerprint, SizeBucket, TtlBucket};

/// Capacity score multiplier for data types outside an engine's affinity.
const OFF_AFFINITY_SCORE: f64 = 0.3;

// == Strategy Decision ==
/// Chosen engine plus a human-readable justification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrategyDecision {
    pub engine: EngineKind,
    pub reason: String,
}

impl StrategyDecision {
    fn new(engine: EngineKind, reason: impl Into<String>) -> Self {
        Self {
            engine,
            reason: reason.into(),
        }
    }
}

// == Select Options ==
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectOptions {
    /// Bypass scoring and use this engine
    pub engine: Option<EngineKind>,
    pub ttl: Option<Duration>,
    /// Overrides type sniffing
    pub data_type: Option<DataType>,
}

/// Per-engine score tables computed once from configuration.
#[derive(Debug, Clone)]
struct EngineScores {
    kind: EngineKind,
    max_item_size: u64,
    persistent: bool,
    ttl: [f64; 5],
    data_type: [f64; 6],
    priority_bonus: f64,
}

impl EngineScores {
    fn build(kind: EngineKind, rank: usize, count: usize, config: &SelectorConfig) -> Self {
        let profile = config.profile(kind);
        let weights = config.weights;
        let persistent = profile.persistent;
        Self {
            kind,
            max_item_size: profile.max_item_size,
            persistent,
            ttl: TtlBucket::ALL.map(|bucket| weights.ttl * ttl_affinity(persistent, bucket)),
            data_type: DataType::ALL.map(|data_type| {
                let affinity = if profile.affinity.contains(&data_type) {
                    1.0
                } else {
                    OFF_AFFINITY_SCORE
                };
                weights.data_type * affinity
            }),
            priority_bonus: weights.priority * (count - rank) as f64,
        }
    }

    /// Fraction of the item limit left after a write of `size` bytes.
    fn headroom(&self, size: u64) -> f64 {
        if self.max_item_size == 0 {
            return 0.0;
        }
        1.0 - size as f64 / self.max_item_size as f64
    }
}

/// How well a TTL class suits a volatile or persistent medium.
fn ttl_affinity(persistent: bool, bucket: TtlBucket) -> f64 {
    match (persistent, bucket) {
        (false, TtlBucket::None) => 0.4,
        (false, TtlBucket::Ephemeral | TtlBucket::Short) => 1.0,
        (false, TtlBucket::Medium) => 0.8,
        (false, TtlBucket::Long) => 0.5,
        (true, TtlBucket::None | TtlBucket::Long) => 1.0,
        (true, TtlBucket::Ephemeral) => 0.1,
        (true, TtlBucket::Short) => 0.2,
        (true, TtlBucket::Medium) => 0.6,
    }
}

// == Storage Strategy ==
/// Adaptive engine selector.
#[derive(Debug)]
pub struct StorageStrategy {
    config: SelectorConfig,
    scores: Vec<EngineScores>,
    cache: DecisionCache,
}

impl Default for StorageStrategy {
    fn default() -> Self {
        Self::new(SelectorConfig::default())
    }
}

impl StorageStrategy {
    // == Constructor ==
    /// Creates a selector with every engine in `config.priority` available.
    pub fn new(config: SelectorConfig) -> Self {
        let cache = DecisionCache::new(config.decision_cache_capacity);
        let mut strategy = Self {
            scores: Vec::new(),
            cache,
            config,
        };
        let all = strategy.config.priority.clone();
        strategy.set_available(&all);
        strategy
    }

    // == Set Available ==
    /// Restricts selection to `kinds`, ordered by configured priority.
    ///
    /// Kinds missing from the priority list rank last, in the order given.
    /// Clears memoized decisions.
    pub fn set_available(&mut self, kinds: &[EngineKind]) {
        let mut ordered: Vec<EngineKind> = self
            .config
            .priority
            .iter()
            .copied()
            .filter(|kind| kinds.contains(kind))
            .collect();
        for kind in kinds {
            if !ordered.contains(kind) {
                ordered.push(*kind);
            }
        }

        let count = ordered.len();
        self.scores = ordered
            .into_iter()
            .enumerate()
            .map(|(rank, kind)| EngineScores::build(kind, rank, count, &self.config))
            .collect();
        self.cache.clear();
    }

    /// Available engines in priority order.
    pub fn available(&self) -> Vec<EngineKind> {
        self.scores.iter().map(|s| s.kind).collect()
    }

    pub fn is_available(&self, kind: EngineKind) -> bool {
        self.scores.iter().any(|s| s.kind == kind)
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    pub fn cache_stats(&self) -> DecisionCacheStats {
        self.cache.stats()
    }

    // == Fingerprint ==
    /// Classifies a write. Size is `key + value` bytes; the type is sniffed from a prefix.
    pub fn fingerprint(&self, key: &str, value: &str, options: &SelectOptions) -> Fingerprint {
        let thresholds = &self.config.thresholds;
        let size = (key.len() + value.len()) as u64;
        Fingerprint::new(
            SizeBucket::classify(size, thresholds),
            TtlBucket::classify(options.ttl, thresholds),
            options.data_type.unwrap_or_else(|| DataType::sniff(value)),
        )
    }

    // == Select Engine ==
    /// Picks the engine that should own `key`.
    ///
    /// # Errors
    /// `EngineUnavailable` if nothing is available or an explicitly requested
    /// engine is not.
    pub fn select_engine(
        &mut self,
        key: &str,
        value: &str,
        options: &SelectOptions,
    ) -> Result<StrategyDecision> {
        let Some(first) = self.scores.first() else {
            return Err(CacheError::EngineUnavailable(
                "no storage engine is available".to_string(),
            ));
        };

        if let Some(kind) = options.engine {
            if !self.is_available(kind) {
                return Err(CacheError::EngineUnavailable(format!(
                    "requested engine '{}' is not available",
                    kind
                )));
            }
            return Ok(StrategyDecision::new(kind, "explicit engine override"));
        }

        let fingerprint = self.fingerprint(key, value, options);
        if fingerprint.data_type == DataType::Empty {
            let engine = self
                .scores
                .iter()
                .find(|s| !s.persistent)
                .unwrap_or(first)
                .kind;
            return Ok(StrategyDecision::new(engine, "empty value fast path"));
        }

        if let Some(decision) = self.cache.get(&fingerprint) {
            return Ok(decision);
        }

        let decision = self.decide(&fingerprint);
        debug!(%fingerprint, engine = %decision.engine, reason = %decision.reason, "engine selected");
        self.cache.insert(&fingerprint, decision.clone());
        Ok(decision)
    }

    /// Full scoring path. Assumes at least one engine is available.
    fn decide(&self, fingerprint: &Fingerprint) -> StrategyDecision {
        let thresholds = &self.config.thresholds;

        if fingerprint.ttl == TtlBucket::Ephemeral && self.is_available(EngineKind::Memory) {
            return StrategyDecision::new(
                EngineKind::Memory,
                format!(
                    "ttl at or below {}ms forces memory",
                    thresholds.force_memory_ttl.as_millis()
                ),
            );
        }
        if fingerprint.size == SizeBucket::Large
            && fingerprint.data_type == DataType::Binary
            && self.is_available(EngineKind::IndexedDb)
        {
            return StrategyDecision::new(
                EngineKind::IndexedDb,
                "large binary payload forces indexeddb",
            );
        }

        let size = fingerprint.size.representative(thresholds);
        let capacity_weight = self.config.weights.capacity;
        let mut best: Option<(&EngineScores, f64, f64)> = None;
        for scores in self.scores.iter().filter(|s| s.max_item_size >= size) {
            let capacity = capacity_weight * scores.headroom(size);
            let total = capacity
                + scores.ttl[fingerprint.ttl.index()]
                + scores.data_type[fingerprint.data_type.index()]
                + scores.priority_bonus;
            if best.map_or(true, |(_, _, top)| total > top) {
                best = Some((scores, capacity, total));
            }
        }

        match best {
            Some((scores, capacity, total)) => StrategyDecision::new(
                scores.kind,
                format!(
                    "{} scored {:.3} for {} (capacity {:.2}, ttl {:.2}, type {:.2})",
                    scores.kind,
                    total,
                    fingerprint,
                    capacity,
                    scores.ttl[fingerprint.ttl.index()],
                    scores.data_type[fingerprint.data_type.index()]
                ),
            ),
            None => {
                let largest = self
                    .scores
                    .iter()
                    .reduce(|acc, s| {
                        if s.max_item_size > acc.max_item_size {
                            s
                        } else {
                            acc
                        }
                    })
                    .map_or(EngineKind::Memory, |s| s.kind);
                StrategyDecision::new(
                    largest,
                    format!(
                        "no engine accepts {} items; using the largest item limit",
                        fingerprint
                    ),
                )
            }
        }
    }
}
