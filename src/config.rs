//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::DEFAULT_MAX_SIZE;
use crate::engine::EngineOptions;
use crate::eviction::LruStrategy;
use crate::manager::ManagerConfig;
use crate::selector::SelectorConfig;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Byte budget of each engine
    pub max_size: u64,
    /// Item budget of each engine, unlimited when None
    pub max_items: Option<usize>,
    /// Eviction strategy name for every engine
    pub eviction_strategy: String,
    /// Default TTL in milliseconds for entries without explicit TTL
    pub default_ttl_ms: Option<u64>,
    /// HTTP server port
    pub server_port: u16,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// Directory of the persistent engine; none disables it
    pub data_dir: Option<PathBuf>,
    /// Bound of the engine decision cache
    pub decision_cache_size: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_SIZE` - Per-engine byte budget (default: 5 MiB)
    /// - `MAX_ITEMS` - Per-engine item budget (default: unlimited)
    /// - `EVICTION_STRATEGY` - lru, lfu, fifo, mru, random, ttl or arc (default: lru)
    /// - `DEFAULT_TTL_MS` - Default TTL in milliseconds (default: none)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 1)
    /// - `DATA_DIR` - Enables the persistent engine in this directory (default: unset)
    /// - `DECISION_CACHE_SIZE` - Memoized engine decisions (default: 256)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_size: parse_var("MAX_SIZE").unwrap_or(defaults.max_size),
            max_items: parse_var("MAX_ITEMS").or(defaults.max_items),
            eviction_strategy: env::var("EVICTION_STRATEGY")
                .ok()
                .map(|v| v.trim().to_ascii_lowercase())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.eviction_strategy),
            default_ttl_ms: parse_var("DEFAULT_TTL_MS").or(defaults.default_ttl_ms),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            cleanup_interval: parse_var("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
            data_dir: env::var("DATA_DIR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            decision_cache_size: parse_var("DECISION_CACHE_SIZE")
                .unwrap_or(defaults.decision_cache_size),
        }
    }

    /// Options every engine is built with.
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            max_size: self.max_size,
            max_items: self.max_items,
            eviction_strategy: self.eviction_strategy.clone(),
        }
    }

    pub fn manager_config(&self) -> ManagerConfig {
        ManagerConfig {
            default_ttl: self.default_ttl_ms.map(Duration::from_millis),
            selector: SelectorConfig::default()
                .with_decision_cache_capacity(self.decision_cache_size),
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            max_items: None,
            eviction_strategy: LruStrategy::NAME.to_string(),
            default_ttl_ms: None,
            server_port: 3000,
            cleanup_interval: 1,
            data_dir: None,
            decision_cache_size: 256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.max_size, 5 * 1024 * 1024);
        assert_eq!(config.max_items, None);
        assert_eq!(config.eviction_strategy, "lru");
        assert_eq!(config.default_ttl_ms, None);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cleanup_interval, 1);
        assert_eq!(config.data_dir, None);
        assert_eq!(config.decision_cache_size, 256);
    }

    #[test]
    fn test_config_from_env() {
        // Single test touches the environment so parallel tests cannot race on it
        for name in [
            "MAX_SIZE",
            "MAX_ITEMS",
            "EVICTION_STRATEGY",
            "DEFAULT_TTL_MS",
            "SERVER_PORT",
            "CLEANUP_INTERVAL",
            "DATA_DIR",
            "DECISION_CACHE_SIZE",
        ] {
            env::remove_var(name);
        }
        assert_eq!(Config::from_env(), Config::default());

        env::set_var("MAX_ITEMS", "10");
        env::set_var("EVICTION_STRATEGY", " ARC ");
        env::set_var("DEFAULT_TTL_MS", "1500");
        env::set_var("SERVER_PORT", "not-a-port");
        let config = Config::from_env();
        env::remove_var("MAX_ITEMS");
        env::remove_var("EVICTION_STRATEGY");
        env::remove_var("DEFAULT_TTL_MS");
        env::remove_var("SERVER_PORT");

        assert_eq!(config.max_items, Some(10));
        assert_eq!(config.eviction_strategy, "arc");
        assert_eq!(config.default_ttl_ms, Some(1500));
        assert_eq!(config.server_port, 3000);
    }

    #[test]
    fn test_config_derived_settings() {
        let config = Config {
            default_ttl_ms: Some(250),
            decision_cache_size: 8,
            max_items: Some(3),
            ..Config::default()
        };

        let options = config.engine_options();
        assert_eq!(options.max_items, Some(3));
        assert_eq!(options.eviction_strategy, "lru");

        let manager = config.manager_config();
        assert_eq!(manager.default_ttl, Some(Duration::from_millis(250)));
        assert_eq!(manager.selector.decision_cache_capacity, 8);
    }
}
