//! Engine Kind Module
//!
//! Names of the physical backends the selector reasons about.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CacheError;

// == Engine Kind ==
/// A storage medium class.
///
/// The kind describes the medium's traits (volatile or persistent, per-item
/// limits); any `StorageEngine` implementation can be registered under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Process memory, gone on restart
    Memory,
    /// Per-session store, gone when the session ends
    Session,
    /// Small persistent key/value store
    Local,
    /// Tiny persistent store with strict per-item limits
    Cookie,
    /// Embedded database for large and binary values
    IndexedDb,
}

impl EngineKind {
    pub const ALL: [EngineKind; 5] = [
        EngineKind::Memory,
        EngineKind::Session,
        EngineKind::Local,
        EngineKind::Cookie,
        EngineKind::IndexedDb,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Memory => "memory",
            EngineKind::Session => "session",
            EngineKind::Local => "local",
            EngineKind::Cookie => "cookie",
            EngineKind::IndexedDb => "indexeddb",
        }
    }

    /// Whether data outlives the process or session.
    pub fn is_persistent(&self) -> bool {
        matches!(
            self,
            EngineKind::Local | EngineKind::Cookie | EngineKind::IndexedDb
        )
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineKind {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EngineKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CacheError::InvalidRequest(format!("Unknown engine: {s}")))
    }
}
