//! Selector Configuration Module
//!
//! Static inputs to engine selection: priorities, per-engine profiles,
//! bucket thresholds and score weights. All numbers here are tunable defaults.

use std::collections::HashMap;
use std::time::Duration;

use crate::engine::EngineKind;

use super::DataType;

// == Engine Profile ==
/// What the selector knows about a medium.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineProfile {
    /// Largest single item the medium accepts
    pub max_item_size: u64,
    /// Whether data outlives the process or session
    pub persistent: bool,
    /// Data types the medium handles well
    pub affinity: Vec<DataType>,
}

impl EngineProfile {
    /// Built-in profile for a medium class.
    pub fn default_for(kind: EngineKind) -> Self {
        const KIB: u64 = 1024;
        const MIB: u64 = 1024 * 1024;
        let scalar = [DataType::Text, DataType::Number, DataType::Boolean];
        match kind {
            EngineKind::Memory => Self {
                max_item_size: MIB,
                persistent: false,
                affinity: [&scalar[..], &[DataType::Json, DataType::Empty][..]].concat(),
            },
            EngineKind::Session => Self {
                max_item_size: MIB,
                persistent: false,
                affinity: [&scalar[..], &[DataType::Json][..]].concat(),
            },
            EngineKind::Local => Self {
                max_item_size: MIB,
                persistent: true,
                affinity: [&scalar[..], &[DataType::Json][..]].concat(),
            },
            EngineKind::Cookie => Self {
                max_item_size: 4 * KIB,
                persistent: true,
                affinity: scalar.to_vec(),
            },
            EngineKind::IndexedDb => Self {
                max_item_size: u64::MAX,
                persistent: true,
                affinity: vec![DataType::Json, DataType::Binary, DataType::Text],
            },
        }
    }
}

// == Thresholds ==
/// Bucket boundaries and override triggers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thresholds {
    pub tiny_value_max: u64,
    pub small_value_max: u64,
    pub medium_value_max: u64,
    /// TTLs at or below this always go to memory
    pub force_memory_ttl: Duration,
    pub short_ttl: Duration,
    pub medium_ttl: Duration,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            tiny_value_max: 1024,
            small_value_max: 64 * 1024,
            medium_value_max: 1024 * 1024,
            force_memory_ttl: Duration::from_secs(5),
            short_ttl: Duration::from_secs(5 * 60),
            medium_ttl: Duration::from_secs(60 * 60),
        }
    }
}

// == Score Weights ==
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub capacity: f64,
    pub ttl: f64,
    pub data_type: f64,
    /// Added per rank step in the priority list; breaks near-ties
    pub priority: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            capacity: 0.5,
            ttl: 0.3,
            data_type: 0.2,
            priority: 0.001,
        }
    }
}

// == Selector Config ==
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorConfig {
    /// Engines in preference order
    pub priority: Vec<EngineKind>,
    pub profiles: HashMap<EngineKind, EngineProfile>,
    pub thresholds: Thresholds,
    pub weights: ScoreWeights,
    /// Bound of the decision cache; 0 disables memoization
    pub decision_cache_capacity: usize,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            priority: EngineKind::ALL.to_vec(),
            profiles: EngineKind::ALL
                .into_iter()
                .map(|kind| (kind, EngineProfile::default_for(kind)))
                .collect(),
            thresholds: Thresholds::default(),
            weights: ScoreWeights::default(),
            decision_cache_capacity: 256,
        }
    }
}

impl SelectorConfig {
    pub fn with_decision_cache_capacity(mut self, capacity: usize) -> Self {
        self.decision_cache_capacity = capacity;
        self
    }

    /// Profile for `kind`, falling back to the built-in one.
    pub fn profile(&self, kind: EngineKind) -> EngineProfile {
        self.profiles
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| EngineProfile::default_for(kind))
    }
}
