//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use std::sync::Arc;
use tokio::sync::RwLock;

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

use crate::config::Config;
use crate::engine::{DiskEngine, EngineContext, EngineKind, MemoryEngine};
use crate::error::{CacheError, Result};
use crate::manager::CacheManager;
use crate::models::{
    CleanupResponse, DeleteResponse, GetResponse, HealthResponse, KeysResponse, SetRequest,
    SetResponse, StatsResponse,
};

/// Application state shared across all handlers.
///
/// Contains the cache manager wrapped in Arc<RwLock<>> for thread-safe access.
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe cache manager
    pub manager: Arc<RwLock<CacheManager>>,
}

impl AppState {
    /// Creates a new AppState with the given cache manager.
    pub fn new(manager: CacheManager) -> Self {
        Self {
            manager: Arc::new(RwLock::new(manager)),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Registers memory and session engines, plus a persistent `indexeddb`
    /// engine under `data_dir` when one is configured.
    ///
    /// # Errors
    /// Fails on an unknown eviction strategy or an unusable data directory.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let context = EngineContext::default();
        let options = config.engine_options();
        let mut manager = CacheManager::new(config.manager_config());

        for kind in [EngineKind::Memory, EngineKind::Session] {
            let engine = MemoryEngine::with_context(kind, options.clone(), &context)?;
            manager.register_engine(Box::new(engine));
        }

        if let Some(dir) = &config.data_dir {
            let engine =
                DiskEngine::open(EngineKind::IndexedDb, dir.join("indexeddb"), options, &context)
                    .await?;
            info!(dir = %engine.dir().display(), "persistent engine opened");
            manager.register_engine(Box::new(engine));
        }

        Ok(Self::new(manager))
    }
}

/// Handler for PUT /set
///
/// Stores a key-value pair in the engine picked by the selector (or the one requested).
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    // Validate request
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let options = req.options();
    let mut manager = state.manager.write().await;
    let decision = manager.set(&req.key, req.value, options).await?;

    Ok(Json(SetResponse::new(req.key, decision)))
}

/// Handler for GET /get/:key
///
/// Retrieves a value by key. Expired entries read as not found.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    // Write lock: reads update recency and counters
    let mut manager = state.manager.write().await;
    match manager.get(&key).await? {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for DELETE /del/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let mut manager = state.manager.write().await;
    if !manager.remove(&key).await? {
        return Err(CacheError::NotFound(key));
    }

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for GET /keys
pub async fn keys_handler(State(state): State<AppState>) -> Result<Json<KeysResponse>> {
    let manager = state.manager.read().await;
    Ok(Json(KeysResponse::new(manager.keys().await?)))
}

/// Handler for POST /cleanup
///
/// Runs an expiry sweep immediately, independent of the background task.
pub async fn cleanup_handler(State(state): State<AppState>) -> Result<Json<CleanupResponse>> {
    let mut manager = state.manager.write().await;
    let removed = manager.cleanup().await?;
    Ok(Json(CleanupResponse { removed }))
}

/// Handler for GET /stats
///
/// Returns façade counters, decision cache counters and per-engine usage.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let manager = state.manager.read().await;

    Json(StatsResponse::new(
        manager.stats(),
        manager.selector_stats(),
        manager.usage(),
    ))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
