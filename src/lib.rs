//! Tiered Cache - A pluggable multi-backend cache
//!
//! Routes each write to the storage engine best suited to it, bounds every
//! engine's memory with a swappable eviction strategy and expires entries
//! through a min-heap of deadlines.

pub mod api;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod eviction;
pub mod manager;
pub mod models;
pub mod selector;
pub mod tasks;

pub use api::{create_router, AppState};
pub use config::Config;
pub use engine::{DiskEngine, EngineKind, EngineOptions, MemoryEngine, StorageEngine};
pub use error::{CacheError, Result};
pub use eviction::{EvictionStrategy, EvictionStrategyFactory};
pub use manager::{CacheManager, ManagerConfig, SetOptions};
pub use selector::{StorageStrategy, StrategyDecision};
pub use tasks::spawn_cleanup_task;
