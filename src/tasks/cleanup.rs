//! TTL Cleanup Task
//!
//! Background task that periodically sweeps expired entries from every engine.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::manager::CacheManager;

/// Spawns a background task that periodically cleans up expired cache entries.
///
/// Each run takes the manager's write lock for the duration of one sweep.
/// A failing sweep is logged and retried on the next tick.
///
/// # Arguments
/// * `manager` - shared cache manager
/// * `cleanup_interval_secs` - Interval in seconds between cleanup runs
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let manager = Arc::new(RwLock::new(CacheManager::default()));
/// let cleanup_handle = spawn_cleanup_task(manager.clone(), 1);
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task(
    manager: Arc<RwLock<CacheManager>>,
    cleanup_interval_secs: u64,
) -> JoinHandle<()> {
    let period = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting TTL cleanup task with interval of {} seconds",
            period.as_secs()
        );

        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let result = {
                let mut guard = manager.write().await;
                guard.cleanup().await
            };

            match result {
                Ok(0) => debug!("TTL cleanup: no expired entries found"),
                Ok(removed) => info!("TTL cleanup: removed {} expired entries", removed),
                Err(err) => warn!(error = %err, "TTL cleanup failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineOptions, MemoryEngine};
    use crate::manager::SetOptions;

    fn shared_manager() -> Arc<RwLock<CacheManager>> {
        let mut manager = CacheManager::default();
        manager.register_engine(Box::new(MemoryEngine::new(EngineOptions::default()).unwrap()));
        Arc::new(RwLock::new(manager))
    }

    #[tokio::test]
    async fn test_cleanup_task_removes_expired_entries() {
        let manager = shared_manager();

        // Add an entry with very short TTL
        {
            let mut guard = manager.write().await;
            guard
                .set(
                    "expire_soon",
                    "value".to_string(),
                    SetOptions::with_ttl(Duration::from_millis(200)),
                )
                .await
                .unwrap();
        }

        let handle = spawn_cleanup_task(manager.clone(), 1);

        // Wait for entry to expire and cleanup to run
        tokio::time::sleep(Duration::from_millis(1500)).await;

        // Swept by the task, not lazily on read
        {
            let guard = manager.read().await;
            let usage = guard.usage();
            assert_eq!(usage[0].items, 0, "Expired entry should have been cleaned up");
            assert_eq!(guard.stats().expirations, 1);
        }

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_preserves_valid_entries() {
        let manager = shared_manager();

        {
            let mut guard = manager.write().await;
            guard
                .set(
                    "long_lived",
                    "value".to_string(),
                    SetOptions::with_ttl(Duration::from_secs(3600)),
                )
                .await
                .unwrap();
        }

        let handle = spawn_cleanup_task(manager.clone(), 1);

        tokio::time::sleep(Duration::from_millis(1500)).await;

        {
            let mut guard = manager.write().await;
            let result = guard.get("long_lived").await.unwrap();
            assert_eq!(result, Some("value".to_string()), "Valid entry should not be removed");
        }

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let handle = spawn_cleanup_task(shared_manager(), 1);

        // Abort immediately
        handle.abort();

        // Wait a bit and verify task is finished
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
