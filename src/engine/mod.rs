//! Storage Engine Module
//!
//! The uniform async key/value contract every physical backend implements,
//! plus the in-memory reference engine and a directory-backed engine.

mod disk;
mod index;
mod kind;
mod memory;

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::cache::{Clock, SystemClock, DEFAULT_MAX_SIZE};
use crate::error::Result;
use crate::eviction::{EvictionStats, EvictionStrategyFactory, LruStrategy};

pub use disk::DiskEngine;
pub use index::{EngineIndex, Lookup};
pub use kind::EngineKind;
pub use memory::MemoryEngine;

// == Storage Engine ==
/// Async key/value contract shared by every backend.
///
/// Each engine enforces its own byte and item budget, owns one eviction
/// strategy and one expiration heap, and never shares them with other engines.
///
/// # Implementation Notes
///
/// - Methods are async even where the medium is synchronous
/// - Index and heap mutation happens before or after awaited I/O, never across it
/// - An expired entry reads as `None`; expiry is never an error
#[async_trait]
pub trait StorageEngine: Send + Sync + Debug {
    /// Medium class this engine is registered as.
    fn kind(&self) -> EngineKind;

    /// Stores `value` under `key`, evicting as needed.
    ///
    /// # Errors
    /// `CapacityExceeded` when the item cannot fit even after eviction.
    async fn set_item(&mut self, key: &str, value: String, ttl: Option<Duration>) -> Result<()>;

    /// Returns the value if present and not expired.
    async fn get_item(&mut self, key: &str) -> Result<Option<String>>;

    /// Removes `key`. Returns whether it was resident.
    async fn remove_item(&mut self, key: &str) -> Result<bool>;

    async fn clear(&mut self) -> Result<()>;

    /// Resident, non-expired keys.
    async fn keys(&self) -> Result<Vec<String>>;

    /// Number of resident, non-expired keys.
    async fn length(&self) -> Result<usize>;

    /// Drops every expired entry. Returns how many were removed.
    async fn cleanup(&mut self) -> Result<usize>;

    /// Byte usage and counters.
    fn usage(&self) -> EngineUsage;
}

// == Engine Options ==
/// Construction options shared by all engines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Byte budget
    pub max_size: u64,
    /// Item budget, unlimited when None
    pub max_items: Option<usize>,
    /// Eviction strategy name, resolved through the factory
    pub eviction_strategy: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            max_items: None,
            eviction_strategy: LruStrategy::NAME.to_string(),
        }
    }
}

impl EngineOptions {
    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = Some(max_items);
        self
    }

    pub fn with_strategy(mut self, name: impl Into<String>) -> Self {
        self.eviction_strategy = name.into();
        self
    }
}

// == Engine Context ==
/// Collaborators an engine is built with: where strategies come from and what time it is.
#[derive(Debug, Clone)]
pub struct EngineContext {
    pub factory: EvictionStrategyFactory,
    pub clock: Arc<dyn Clock>,
}

impl Default for EngineContext {
    fn default() -> Self {
        Self {
            factory: EvictionStrategyFactory::default(),
            clock: Arc::new(SystemClock),
        }
    }
}

impl EngineContext {
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            ..Self::default()
        }
    }
}

// == Engine Usage ==
/// Snapshot of an engine's resource use.
#[derive(Debug, Clone, Serialize)]
pub struct EngineUsage {
    pub kind: EngineKind,
    pub used_size: u64,
    pub max_size: u64,
    pub items: usize,
    pub max_items: Option<usize>,
    /// Entries removed under capacity pressure
    pub evictions: u64,
    /// Entries removed because their TTL elapsed
    pub expirations: u64,
    pub strategy: EvictionStats,
}
