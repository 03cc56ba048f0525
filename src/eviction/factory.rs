//! Strategy Factory Module
//!
//! Name → constructor registry for eviction strategies.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::{
    ArcStrategy, EvictionStrategy, FifoStrategy, LfuStrategy, LruStrategy, MruStrategy,
    RandomStrategy, TtlStrategy,
};
use crate::cache::{Clock, SystemClock};
use crate::error::{CacheError, Result};

/// Builds a fresh strategy instance reading time from the owning engine's clock.
pub type StrategyConstructor =
    Arc<dyn Fn(Arc<dyn Clock>) -> Box<dyn EvictionStrategy> + Send + Sync>;

// == Eviction Strategy Factory ==
/// Registry of eviction strategies by case-insensitive name.
///
/// `Default` registers the built-ins: `lru`, `lfu`, `fifo`, `mru`, `random`, `ttl`, `arc`.
#[derive(Clone)]
pub struct EvictionStrategyFactory {
    constructors: HashMap<String, StrategyConstructor>,
}

impl Default for EvictionStrategyFactory {
    fn default() -> Self {
        let mut factory = Self::empty();
        factory.register(LruStrategy::NAME, |_| Box::new(LruStrategy::new()));
        factory.register(LfuStrategy::NAME, |_| Box::new(LfuStrategy::new()));
        factory.register(FifoStrategy::NAME, |_| Box::new(FifoStrategy::new()));
        factory.register(MruStrategy::NAME, |_| Box::new(MruStrategy::new()));
        factory.register(RandomStrategy::NAME, |_| Box::new(RandomStrategy::new()));
        factory.register(TtlStrategy::NAME, |clock| {
            Box::new(TtlStrategy::with_clock(clock))
        });
        factory.register(ArcStrategy::NAME, |_| Box::new(ArcStrategy::new()));
        factory
    }
}

impl EvictionStrategyFactory {
    /// Factory with the built-in strategies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory with nothing registered.
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    // == Register ==
    /// Adds a strategy, replacing any previous one under the same name.
    ///
    /// The constructor receives the clock of the engine the strategy is built
    /// for; time-based policies must read deadlines from it.
    pub fn register<F>(&mut self, name: &str, constructor: F)
    where
        F: Fn(Arc<dyn Clock>) -> Box<dyn EvictionStrategy> + Send + Sync + 'static,
    {
        self.constructors
            .insert(name.to_ascii_lowercase(), Arc::new(constructor));
    }

    // == Create ==
    /// Builds a new instance of the named strategy on the wall clock.
    pub fn create(&self, name: &str) -> Result<Box<dyn EvictionStrategy>> {
        self.create_with_clock(name, Arc::new(SystemClock))
    }

    /// Builds a new instance of the named strategy on `clock`.
    ///
    /// # Errors
    /// `UnknownStrategy` if nothing is registered under `name`.
    pub fn create_with_clock(
        &self,
        name: &str,
        clock: Arc<dyn Clock>,
    ) -> Result<Box<dyn EvictionStrategy>> {
        self.constructors
            .get(&name.to_ascii_lowercase())
            .map(|constructor| constructor(clock))
            .ok_or_else(|| CacheError::UnknownStrategy(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(&name.to_ascii_lowercase())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.constructors.keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for EvictionStrategyFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvictionStrategyFactory")
            .field("names", &self.names())
            .finish()
    }
}
