//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies.

use std::time::Duration;

use serde::Deserialize;

use crate::cache::MAX_KEY_LENGTH;
use crate::engine::EngineKind;
use crate::manager::SetOptions;

/// Request body for the SET operation (PUT /set)
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: The pre-serialized value to store
/// - `ttl_ms`: Optional TTL in milliseconds (uses default if not specified)
/// - `engine`: Optional engine name, bypassing engine selection
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The cache key
    pub key: String,
    /// The value to store
    pub value: String,
    /// Optional TTL in milliseconds
    #[serde(default)]
    pub ttl_ms: Option<u64>,
    /// Optional target engine
    #[serde(default)]
    pub engine: Option<EngineKind>,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        if self.key.len() > MAX_KEY_LENGTH {
            return Some(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            ));
        }
        if self.ttl_ms == Some(0) {
            return Some("TTL must be greater than zero".to_string());
        }
        None
    }

    pub fn options(&self) -> SetOptions {
        SetOptions {
            ttl: self.ttl_ms.map(Duration::from_millis),
            engine: self.engine,
        }
    }
}
