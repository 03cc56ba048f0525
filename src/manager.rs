//! Cache Manager Module
//!
//! Façade composing registered storage engines with the engine selector.
//! A key is owned by at most one engine at a time.

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::cache::{CacheStats, MAX_KEY_LENGTH};
use crate::engine::{EngineKind, EngineUsage, StorageEngine};
use crate::error::{CacheError, Result};
use crate::selector::{
    DecisionCacheStats, SelectOptions, SelectorConfig, StorageStrategy, StrategyDecision,
};

// == Manager Config ==
#[derive(Debug, Clone, Default)]
pub struct ManagerConfig {
    /// TTL applied to writes that carry none
    pub default_ttl: Option<Duration>,
    pub selector: SelectorConfig,
}

// == Set Options ==
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    pub ttl: Option<Duration>,
    /// Skip selection and write to this engine
    pub engine: Option<EngineKind>,
}

impl SetOptions {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl: Some(ttl),
            engine: None,
        }
    }

    pub fn on(engine: EngineKind) -> Self {
        Self {
            ttl: None,
            engine: Some(engine),
        }
    }
}

// == Cache Manager ==
#[derive(Debug)]
pub struct CacheManager {
    engines: BTreeMap<EngineKind, Box<dyn StorageEngine>>,
    selector: StorageStrategy,
    default_ttl: Option<Duration>,
    stats: CacheStats,
}

impl Default for CacheManager {
    fn default() -> Self {
        Self::new(ManagerConfig::default())
    }
}

impl CacheManager {
    // == Constructor ==
    /// Creates a manager with no engines; register at least one before writing.
    pub fn new(config: ManagerConfig) -> Self {
        let mut selector = StorageStrategy::new(config.selector);
        selector.set_available(&[]);
        Self {
            engines: BTreeMap::new(),
            selector,
            default_ttl: config.default_ttl,
            stats: CacheStats::new(),
        }
    }

    // == Register Engine ==
    /// Adds `engine` under its kind, replacing any engine already registered there.
    pub fn register_engine(&mut self, engine: Box<dyn StorageEngine>) {
        let kind = engine.kind();
        if self.engines.insert(kind, engine).is_some() {
            warn!(engine = %kind, "replaced registered engine");
        } else {
            info!(engine = %kind, "registered engine");
        }
        let kinds: Vec<EngineKind> = self.engines.keys().copied().collect();
        self.selector.set_available(&kinds);
    }

    /// Registered engines in selection priority order.
    pub fn engines(&self) -> Vec<EngineKind> {
        self.selector.available()
    }

    // == Set ==
    /// Stores `value` under `key` in the selected engine.
    ///
    /// On success any copy of `key` held by another engine is removed. A failure
    /// to remove such a copy is logged and does not fail the write.
    ///
    /// # Errors
    /// - `InvalidRequest` for an empty or over-long key
    /// - `EngineUnavailable` when no engine (or not the requested one) is registered
    /// - `CapacityExceeded` when the chosen engine cannot admit the item
    pub async fn set(
        &mut self,
        key: &str,
        value: String,
        options: SetOptions,
    ) -> Result<StrategyDecision> {
        validate_key(key)?;
        let ttl = options.ttl.or(self.default_ttl);
        let decision = self.selector.select_engine(
            key,
            &value,
            &SelectOptions {
                engine: options.engine,
                ttl,
                data_type: None,
            },
        )?;

        let engine = self.engines.get_mut(&decision.engine).ok_or_else(|| {
            CacheError::EngineUnavailable(format!("engine '{}' is not registered", decision.engine))
        })?;
        if let Err(err) = engine.set_item(key, value, ttl).await {
            self.stats.record_rejected_write();
            return Err(err);
        }
        self.stats.record_write();

        // The write is committed; a stale copy that cannot be dropped is only logged.
        for (kind, other) in self.engines.iter_mut() {
            if *kind == decision.engine {
                continue;
            }
            match other.remove_item(key).await {
                Ok(true) => {
                    debug!(key, from = %kind, to = %decision.engine, "moved key between engines")
                }
                Ok(false) => {}
                Err(err) => {
                    warn!(key, engine = %kind, error = %err, "failed to drop stale copy after write")
                }
            }
        }
        Ok(decision)
    }

    // == Set Many ==
    /// Writes each pair independently; a failure does not undo earlier writes.
    pub async fn set_many(
        &mut self,
        items: Vec<(String, String)>,
        options: SetOptions,
    ) -> Vec<Result<StrategyDecision>> {
        let mut results = Vec::with_capacity(items.len());
        for (key, value) in items {
            results.push(self.set(&key, value, options).await);
        }
        results
    }

    // == Get ==
    /// Returns the live value of `key`, searching engines in priority order.
    pub async fn get(&mut self, key: &str) -> Result<Option<String>> {
        for kind in self.selector.available() {
            let Some(engine) = self.engines.get_mut(&kind) else {
                continue;
            };
            if let Some(value) = engine.get_item(key).await? {
                self.stats.record_hit();
                return Ok(Some(value));
            }
        }
        self.stats.record_miss();
        Ok(None)
    }

    pub async fn get_many(&mut self, keys: &[String]) -> Result<Vec<Option<String>>> {
        let mut values = Vec::with_capacity(keys.len());
        for key in keys {
            values.push(self.get(key).await?);
        }
        Ok(values)
    }

    // == Remove ==
    /// Removes `key` from every engine. Returns whether any held it.
    pub async fn remove(&mut self, key: &str) -> Result<bool> {
        let mut removed = false;
        for engine in self.engines.values_mut() {
            removed |= engine.remove_item(key).await?;
        }
        if removed {
            self.stats.record_delete();
        }
        Ok(removed)
    }

    pub async fn clear(&mut self) -> Result<()> {
        for engine in self.engines.values_mut() {
            engine.clear().await?;
        }
        Ok(())
    }

    /// Live keys across engines, sorted.
    pub async fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for engine in self.engines.values() {
            keys.extend(engine.keys().await?);
        }
        keys.sort();
        keys.dedup();
        Ok(keys)
    }

    pub async fn len(&self) -> Result<usize> {
        let mut total = 0;
        for engine in self.engines.values() {
            total += engine.length().await?;
        }
        Ok(total)
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    // == Cleanup ==
    /// Sweeps expired entries from every engine. Returns the total removed.
    pub async fn cleanup(&mut self) -> Result<usize> {
        let mut removed = 0;
        for engine in self.engines.values_mut() {
            removed += engine.cleanup().await?;
        }
        Ok(removed)
    }

    // == Stats ==
    /// Façade counters with engine evictions, expirations and residency folded in.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        for usage in self.usage() {
            stats.evictions += usage.evictions;
            stats.expirations += usage.expirations;
            stats.total_entries += usage.items;
        }
        stats
    }

    pub fn usage(&self) -> Vec<EngineUsage> {
        self.engines.values().map(|engine| engine.usage()).collect()
    }

    pub fn selector_stats(&self) -> DecisionCacheStats {
        self.selector.cache_stats()
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidRequest("Key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidRequest(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::engine::{EngineContext, EngineOptions, MemoryEngine};
    use std::sync::Arc;

    fn memory(kind: EngineKind, options: EngineOptions, context: &EngineContext) -> Box<dyn StorageEngine> {
        Box::new(MemoryEngine::with_context(kind, options, context).unwrap())
    }

    fn manager_with(kinds: &[EngineKind]) -> (CacheManager, ManualClock) {
        let clock = ManualClock::new(0);
        let context = EngineContext::with_clock(Arc::new(clock.clone()));
        let mut manager = CacheManager::default();
        for kind in kinds {
            manager.register_engine(memory(*kind, EngineOptions::default(), &context));
        }
        (manager, clock)
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let (mut manager, _) = manager_with(&[EngineKind::Memory]);

        let decision = manager
            .set("key1", "value1".to_string(), SetOptions::default())
            .await
            .unwrap();

        assert_eq!(decision.engine, EngineKind::Memory);
        assert_eq!(manager.get("key1").await.unwrap(), Some("value1".to_string()));
        assert_eq!(manager.stats().hits, 1);
        assert_eq!(manager.stats().writes, 1);
    }

    #[tokio::test]
    async fn test_get_missing_counts_miss() {
        let (mut manager, _) = manager_with(&[EngineKind::Memory]);
        assert_eq!(manager.get("nope").await.unwrap(), None);
        assert_eq!(manager.stats().misses, 1);
    }

    #[tokio::test]
    async fn test_set_without_engines() {
        let mut manager = CacheManager::default();
        let result = manager.set("k", "v".to_string(), SetOptions::default()).await;
        assert!(matches!(result, Err(CacheError::EngineUnavailable(_))));
    }

    #[tokio::test]
    async fn test_set_rejects_bad_keys() {
        let (mut manager, _) = manager_with(&[EngineKind::Memory]);

        let empty = manager.set("", "v".to_string(), SetOptions::default()).await;
        assert!(matches!(empty, Err(CacheError::InvalidRequest(_))));

        let long = "k".repeat(MAX_KEY_LENGTH + 1);
        let result = manager.set(&long, "v".to_string(), SetOptions::default()).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_key_moves_between_engines() {
        let (mut manager, _) = manager_with(&[EngineKind::Memory, EngineKind::Local]);

        manager
            .set("k", "v1".to_string(), SetOptions::on(EngineKind::Local))
            .await
            .unwrap();
        manager
            .set("k", "v2".to_string(), SetOptions::on(EngineKind::Memory))
            .await
            .unwrap();

        assert_eq!(manager.len().await.unwrap(), 1);
        assert_eq!(manager.get("k").await.unwrap(), Some("v2".to_string()));
        let local = manager
            .usage()
            .into_iter()
            .find(|u| u.kind == EngineKind::Local)
            .unwrap();
        assert_eq!(local.items, 0);
    }

    /// Memory engine whose removals always fail.
    #[derive(Debug)]
    struct StuckEngine(MemoryEngine);

    #[async_trait::async_trait]
    impl StorageEngine for StuckEngine {
        fn kind(&self) -> EngineKind {
            self.0.kind()
        }

        async fn set_item(&mut self, key: &str, value: String, ttl: Option<Duration>) -> Result<()> {
            self.0.set_item(key, value, ttl).await
        }

        async fn get_item(&mut self, key: &str) -> Result<Option<String>> {
            self.0.get_item(key).await
        }

        async fn remove_item(&mut self, _key: &str) -> Result<bool> {
            Err(CacheError::EngineUnavailable("medium detached".to_string()))
        }

        async fn clear(&mut self) -> Result<()> {
            self.0.clear().await
        }

        async fn keys(&self) -> Result<Vec<String>> {
            self.0.keys().await
        }

        async fn length(&self) -> Result<usize> {
            self.0.length().await
        }

        async fn cleanup(&mut self) -> Result<usize> {
            self.0.cleanup().await
        }

        fn usage(&self) -> EngineUsage {
            self.0.usage()
        }
    }

    #[tokio::test]
    async fn test_set_survives_failed_stale_removal() {
        let context = EngineContext::default();
        let mut manager = CacheManager::default();
        manager.register_engine(memory(EngineKind::Memory, EngineOptions::default(), &context));
        let stuck = MemoryEngine::with_context(EngineKind::Local, EngineOptions::default(), &context)
            .unwrap();
        manager.register_engine(Box::new(StuckEngine(stuck)));

        manager
            .set("k", "v1".to_string(), SetOptions::on(EngineKind::Local))
            .await
            .unwrap();
        let decision = manager
            .set("k", "v2".to_string(), SetOptions::on(EngineKind::Memory))
            .await
            .unwrap();

        assert_eq!(decision.engine, EngineKind::Memory);
        assert_eq!(manager.stats().writes, 2);
        let items: Vec<(EngineKind, usize)> =
            manager.usage().into_iter().map(|u| (u.kind, u.items)).collect();
        assert!(items.contains(&(EngineKind::Memory, 1)));
        // The stale copy could not be dropped
        assert!(items.contains(&(EngineKind::Local, 1)));
    }

    #[tokio::test]
    async fn test_default_ttl_and_cleanup() {
        let clock = ManualClock::new(0);
        let context = EngineContext::with_clock(Arc::new(clock.clone()));
        let mut manager = CacheManager::new(ManagerConfig {
            default_ttl: Some(Duration::from_secs(60)),
            ..ManagerConfig::default()
        });
        manager.register_engine(memory(EngineKind::Memory, EngineOptions::default(), &context));

        manager.set("short", "a".to_string(), SetOptions::default()).await.unwrap();
        manager
            .set("long", "b".to_string(), SetOptions::with_ttl(Duration::from_secs(600)))
            .await
            .unwrap();

        clock.advance(Duration::from_secs(61));

        assert_eq!(manager.cleanup().await.unwrap(), 1);
        assert_eq!(manager.keys().await.unwrap(), vec!["long".to_string()]);
        assert_eq!(manager.stats().expirations, 1);
    }

    #[tokio::test]
    async fn test_capacity_rejection_counted() {
        let context = EngineContext::default();
        let mut manager = CacheManager::default();
        manager.register_engine(memory(
            EngineKind::Memory,
            EngineOptions::default().with_max_size(8),
            &context,
        ));

        let result = manager
            .set("key", "far too long".to_string(), SetOptions::default())
            .await;

        assert!(matches!(result, Err(CacheError::CapacityExceeded(_))));
        assert_eq!(manager.stats().rejected_writes, 1);
        assert!(manager.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let (mut manager, _) = manager_with(&[EngineKind::Memory, EngineKind::Session]);
        manager.set("a", "1".to_string(), SetOptions::on(EngineKind::Session)).await.unwrap();
        manager.set("b", "2".to_string(), SetOptions::default()).await.unwrap();

        assert!(manager.remove("a").await.unwrap());
        assert!(!manager.remove("a").await.unwrap());
        assert_eq!(manager.stats().deletes, 1);

        manager.clear().await.unwrap();
        assert!(manager.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_many_is_per_item() {
        let (mut manager, _) = manager_with(&[EngineKind::Memory]);

        let results = manager
            .set_many(
                vec![
                    ("a".to_string(), "1".to_string()),
                    (String::new(), "2".to_string()),
                    ("c".to_string(), "3".to_string()),
                ],
                SetOptions::default(),
            )
            .await;

        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());

        let values = manager
            .get_many(&["a".to_string(), "b".to_string(), "c".to_string()])
            .await
            .unwrap();
        assert_eq!(values, vec![Some("1".to_string()), None, Some("3".to_string())]);
    }

    #[tokio::test]
    async fn test_selector_follows_registration() {
        let (mut manager, _) = manager_with(&[EngineKind::IndexedDb, EngineKind::Memory]);

        assert_eq!(
            manager.engines(),
            vec![EngineKind::Memory, EngineKind::IndexedDb]
        );

        let decision = manager
            .set("cfg", "{\"a\":1}".to_string(), SetOptions::default())
            .await
            .unwrap();
        assert_eq!(decision.engine, EngineKind::IndexedDb);

        manager
            .set("cfg2", "{\"b\":2}".to_string(), SetOptions::default())
            .await
            .unwrap();
        assert_eq!(manager.selector_stats().hits, 1);
    }
}
