//! Engine Index Module
//!
//! Synchronous bookkeeping every engine shares: per-key metadata, the
//! expiration heap, the eviction strategy and byte accounting.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::{EngineContext, EngineKind, EngineOptions, EngineUsage};
use crate::cache::{Clock, EntryMeta, MinHeap};
use crate::error::{CacheError, Result};
use crate::eviction::EvictionStrategy;

// == Lookup ==
/// Outcome of reading a key through the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Hit(EntryMeta),
    /// The key was resident but its TTL had elapsed; it has been dropped.
    Expired,
    Miss,
}

// == Engine Index ==
/// Capacity, eviction and TTL state for one engine.
///
/// The index never touches values. Engines call it synchronously around their
/// own I/O and mirror every key it drops.
#[derive(Debug)]
pub struct EngineIndex {
    entries: HashMap<String, EntryMeta>,
    expirations: MinHeap<String>,
    eviction: Box<dyn EvictionStrategy>,
    clock: Arc<dyn Clock>,
    used_size: u64,
    max_size: u64,
    max_items: Option<usize>,
    evicted_count: u64,
    expired_count: u64,
}

impl EngineIndex {
    // == Constructor ==
    /// Creates an empty index.
    ///
    /// # Errors
    /// `UnknownStrategy` if `options.eviction_strategy` is not registered.
    pub fn new(options: &EngineOptions, context: &EngineContext) -> Result<Self> {
        Ok(Self {
            entries: HashMap::new(),
            expirations: MinHeap::new(),
            eviction: context
                .factory
                .create_with_clock(&options.eviction_strategy, Arc::clone(&context.clock))?,
            clock: Arc::clone(&context.clock),
            used_size: 0,
            max_size: options.max_size,
            max_items: options.max_items,
            evicted_count: 0,
            expired_count: 0,
        })
    }

    pub fn now(&self) -> u64 {
        self.clock.now_ms()
    }

    // == Make Room ==
    /// Evicts until an entry of `size` bytes under `key` fits.
    ///
    /// Every evicted key is appended to `evicted`, including on failure, so the
    /// caller can drop the matching values. An entry larger than the whole budget
    /// fails before anything is evicted.
    ///
    /// # Errors
    /// `CapacityExceeded` when the entry can never fit or the strategy runs out of victims.
    pub fn make_room(&mut self, key: &str, size: u64, evicted: &mut Vec<String>) -> Result<()> {
        if size > self.max_size || self.max_items == Some(0) {
            return Err(CacheError::CapacityExceeded(format!(
                "entry '{}' needs {} bytes, engine budget is {} bytes",
                key, size, self.max_size
            )));
        }

        while !self.fits(key, size) {
            let Some(victim) = self.eviction.eviction_key() else {
                return Err(CacheError::CapacityExceeded(format!(
                    "no evictable entry left to make room for '{}' ({} bytes, {} of {} used)",
                    key, size, self.used_size, self.max_size
                )));
            };

            if self.drop_entry(&victim).is_none() {
                warn!(key = %victim, "eviction strategy nominated a key the engine does not hold");
                if self.eviction.eviction_key().as_deref() == Some(victim.as_str()) {
                    return Err(CacheError::Internal(format!(
                        "eviction strategy '{}' keeps nominating unknown key '{}'",
                        self.eviction.name(),
                        victim
                    )));
                }
                continue;
            }

            debug!(key = %victim, strategy = self.eviction.name(), "evicted entry");
            self.evicted_count += 1;
            evicted.push(victim);
        }
        Ok(())
    }

    // == Commit ==
    /// Records an admitted entry. Call after `make_room` succeeded and the value is stored.
    pub fn commit(&mut self, key: &str, meta: EntryMeta, ttl: Option<Duration>) {
        let previous = self.entries.insert(key.to_string(), meta);
        self.used_size = self.used_size - previous.map_or(0, |p| p.size_bytes) + meta.size_bytes;
        self.eviction.record_add(key, ttl);
        match meta.expires_at {
            Some(expires_at) => self.expirations.insert(expires_at, key.to_string()),
            None => {
                self.expirations.remove(key);
            }
        }
    }

    // == Lookup ==
    /// Resolves a read: records the access on a hit, drops the entry if it expired.
    pub fn lookup(&mut self, key: &str) -> Lookup {
        let Some(meta) = self.entries.get(key).copied() else {
            return Lookup::Miss;
        };
        if meta.is_expired(self.now()) {
            self.drop_entry(key);
            self.expired_count += 1;
            debug!(key, "entry expired on read");
            return Lookup::Expired;
        }
        self.eviction.record_access(key);
        Lookup::Hit(meta)
    }

    // == Remove ==
    /// Drops `key` from every structure.
    pub fn remove(&mut self, key: &str) -> Option<EntryMeta> {
        self.drop_entry(key)
    }

    // == Sweep Expired ==
    /// Pops the heap while its root is due. Cost is proportional to the expired count.
    pub fn sweep_expired(&mut self) -> Vec<String> {
        let now = self.now();
        let mut removed = Vec::new();
        while self
            .expirations
            .peek()
            .is_some_and(|node| node.priority <= now)
        {
            let Some(node) = self.expirations.extract_min() else {
                break;
            };
            if let Some(meta) = self.entries.remove(&node.data) {
                self.used_size -= meta.size_bytes;
            }
            self.eviction.remove_key(&node.data);
            self.expired_count += 1;
            removed.push(node.data);
        }
        removed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.expirations.clear();
        self.eviction.clear();
        self.used_size = 0;
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Resident keys whose TTL has not elapsed.
    pub fn live_keys(&self) -> Vec<String> {
        let now = self.now();
        self.entries
            .iter()
            .filter(|(_, meta)| !meta.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    pub fn live_len(&self) -> usize {
        let now = self.now();
        self.entries
            .values()
            .filter(|meta| !meta.is_expired(now))
            .count()
    }

    /// Resident entries, expired or not.
    pub fn resident_len(&self) -> usize {
        self.entries.len()
    }

    pub fn used_size(&self) -> u64 {
        self.used_size
    }

    pub fn expiration_of(&self, key: &str) -> Option<u64> {
        self.expirations.priority_of(key)
    }

    pub fn usage(&self, kind: EngineKind) -> EngineUsage {
        EngineUsage {
            kind,
            used_size: self.used_size,
            max_size: self.max_size,
            items: self.entries.len(),
            max_items: self.max_items,
            evictions: self.evicted_count,
            expirations: self.expired_count,
            strategy: self.eviction.stats(),
        }
    }

    fn fits(&self, key: &str, size: u64) -> bool {
        let current = self.entries.get(key).map(|meta| meta.size_bytes);
        let projected = self.used_size - current.unwrap_or(0) + size;
        let items = self.entries.len() + usize::from(current.is_none());
        projected <= self.max_size && self.max_items.map_or(true, |max| items <= max)
    }

    fn drop_entry(&mut self, key: &str) -> Option<EntryMeta> {
        self.expirations.remove(key);
        self.eviction.remove_key(key);
        let meta = self.entries.remove(key)?;
        self.used_size -= meta.size_bytes;
        Some(meta)
    }
}
