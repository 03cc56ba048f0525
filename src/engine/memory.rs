//! Memory Engine Module
//!
//! Reference engine keeping values in a HashMap.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{
    EngineContext, EngineIndex, EngineKind, EngineOptions, EngineUsage, Lookup, StorageEngine,
};
use crate::cache::CacheEntry;
use crate::error::Result;

// == Memory Engine ==
/// In-process engine with byte/item budgets, eviction and TTL expiry.
#[derive(Debug)]
pub struct MemoryEngine {
    kind: EngineKind,
    index: EngineIndex,
    values: HashMap<String, String>,
}

impl MemoryEngine {
    // == Constructor ==
    /// Creates a memory engine using the built-in strategies and the system clock.
    pub fn new(options: EngineOptions) -> Result<Self> {
        Self::with_context(EngineKind::Memory, options, &EngineContext::default())
    }

    /// Creates an engine registered as `kind`.
    ///
    /// Volatile kinds other than memory (such as session storage) are served by
    /// this engine with their own budget.
    pub fn with_context(
        kind: EngineKind,
        options: EngineOptions,
        context: &EngineContext,
    ) -> Result<Self> {
        Ok(Self {
            kind,
            index: EngineIndex::new(&options, context)?,
            values: HashMap::new(),
        })
    }
}

#[async_trait]
impl StorageEngine for MemoryEngine {
    fn kind(&self) -> EngineKind {
        self.kind
    }

    async fn set_item(&mut self, key: &str, value: String, ttl: Option<Duration>) -> Result<()> {
        let entry = CacheEntry::new(
            key.to_string(),
            value,
            self.index.now(),
            ttl.map(|t| t.as_millis() as u64),
        );

        let mut evicted = Vec::new();
        let admitted = self.index.make_room(key, entry.size_bytes, &mut evicted);
        for victim in &evicted {
            self.values.remove(victim);
        }
        if let Err(err) = admitted {
            warn!(engine = %self.kind, key, error = %err, "write rejected");
            return Err(err);
        }

        self.index.commit(key, entry.meta(), ttl);
        self.values.insert(entry.key, entry.value);
        Ok(())
    }

    async fn get_item(&mut self, key: &str) -> Result<Option<String>> {
        match self.index.lookup(key) {
            Lookup::Hit(_) => Ok(self.values.get(key).cloned()),
            Lookup::Expired => {
                self.values.remove(key);
                Ok(None)
            }
            Lookup::Miss => Ok(None),
        }
    }

    async fn remove_item(&mut self, key: &str) -> Result<bool> {
        if self.index.remove(key).is_some() {
            self.values.remove(key);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn clear(&mut self) -> Result<()> {
        self.index.clear();
        self.values.clear();
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.index.live_keys())
    }

    async fn length(&self) -> Result<usize> {
        Ok(self.index.live_len())
    }

    async fn cleanup(&mut self) -> Result<usize> {
        let removed = self.index.sweep_expired();
        for key in &removed {
            self.values.remove(key);
        }
        if !removed.is_empty() {
            debug!(engine = %self.kind, removed = removed.len(), "swept expired entries");
        }
        Ok(removed.len())
    }

    fn usage(&self) -> EngineUsage {
        self.index.usage(self.kind)
    }
}
