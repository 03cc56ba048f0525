//! Cache Entry Module
//!
//! Defines the stored record and the index metadata engines keep per key.

use serde::{Deserialize, Serialize};

// == Entry Size ==
/// Bytes an entry accounts for against an engine's `max_size`.
pub fn entry_size(key: &str, value: &str) -> u64 {
    (key.len() + value.len()) as u64
}

// == Cache Entry ==
/// A single stored value with its lifecycle metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The cache key
    pub key: String,
    /// The pre-serialized value
    pub value: String,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
    /// Accounted size in bytes
    pub size_bytes: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry written at `now_ms` with an optional TTL in milliseconds.
    pub fn new(key: String, value: String, now_ms: u64, ttl_ms: Option<u64>) -> Self {
        let size_bytes = entry_size(&key, &value);
        Self {
            key,
            value,
            created_at: now_ms,
            expires_at: ttl_ms.map(|ttl| now_ms.saturating_add(ttl)),
            size_bytes,
        }
    }

    /// Index metadata for this entry.
    pub fn meta(&self) -> EntryMeta {
        EntryMeta {
            size_bytes: self.size_bytes,
            created_at: self.created_at,
            expires_at: self.expires_at,
        }
    }

    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.meta().is_expired(now_ms)
    }
}

// == Entry Meta ==
/// What an engine's index remembers about a resident key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryMeta {
    pub size_bytes: u64,
    pub created_at: u64,
    pub expires_at: Option<u64>,
}

impl EntryMeta {
    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: an entry is expired once `now >= expires_at`.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        match self.expires_at {
            Some(expires) => now_ms >= expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(0)` if the entry has expired
    /// - `Some(remaining_ms)` if the entry has TTL and hasn't expired
    /// - `None` if the entry has no TTL (never expires)
    pub fn ttl_remaining_ms(&self, now_ms: u64) -> Option<u64> {
        self.expires_at
            .map(|expires| expires.saturating_sub(now_ms))
    }
}
