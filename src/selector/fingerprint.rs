//! Fingerprint Module
//!
//! Coarse classification of a write: size bucket, TTL bucket and data type.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::Thresholds;

/// Bytes inspected when sniffing a value's type.
const SNIFF_PREFIX: usize = 256;

// == Size Bucket ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeBucket {
    Tiny,
    Small,
    Medium,
    Large,
}

impl SizeBucket {
    pub fn classify(size: u64, thresholds: &Thresholds) -> Self {
        if size <= thresholds.tiny_value_max {
            SizeBucket::Tiny
        } else if size <= thresholds.small_value_max {
            SizeBucket::Small
        } else if size <= thresholds.medium_value_max {
            SizeBucket::Medium
        } else {
            SizeBucket::Large
        }
    }

    /// Size assumed for every write in this bucket when checking engine limits.
    pub fn representative(&self, thresholds: &Thresholds) -> u64 {
        match self {
            SizeBucket::Tiny => thresholds.tiny_value_max,
            SizeBucket::Small => thresholds.small_value_max,
            SizeBucket::Medium => thresholds.medium_value_max,
            SizeBucket::Large => thresholds.medium_value_max.saturating_add(1),
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            SizeBucket::Tiny => "tiny",
            SizeBucket::Small => "small",
            SizeBucket::Medium => "medium",
            SizeBucket::Large => "large",
        }
    }
}

// == TTL Bucket ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TtlBucket {
    /// No expiry
    None,
    /// At or below the force-memory threshold
    Ephemeral,
    Short,
    Medium,
    Long,
}

impl TtlBucket {
    pub const ALL: [TtlBucket; 5] = [
        TtlBucket::None,
        TtlBucket::Ephemeral,
        TtlBucket::Short,
        TtlBucket::Medium,
        TtlBucket::Long,
    ];

    pub fn classify(ttl: Option<Duration>, thresholds: &Thresholds) -> Self {
        match ttl {
            None => TtlBucket::None,
            Some(ttl) if ttl <= thresholds.force_memory_ttl => TtlBucket::Ephemeral,
            Some(ttl) if ttl <= thresholds.short_ttl => TtlBucket::Short,
            Some(ttl) if ttl <= thresholds.medium_ttl => TtlBucket::Medium,
            Some(_) => TtlBucket::Long,
        }
    }

    pub(crate) fn index(&self) -> usize {
        *self as usize
    }

    fn as_str(&self) -> &'static str {
        match self {
            TtlBucket::None => "none",
            TtlBucket::Ephemeral => "ephemeral",
            TtlBucket::Short => "short",
            TtlBucket::Medium => "medium",
            TtlBucket::Long => "long",
        }
    }
}

// == Data Type ==
/// Shape of a serialized value, guessed from a bounded prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Empty,
    Boolean,
    Number,
    Json,
    Binary,
    Text,
}

impl DataType {
    pub const ALL: [DataType; 6] = [
        DataType::Empty,
        DataType::Boolean,
        DataType::Number,
        DataType::Json,
        DataType::Binary,
        DataType::Text,
    ];

    // == Sniff ==
    /// Guesses the type without scanning the whole value.
    ///
    /// Base64 payloads and `data:` URIs count as binary.
    pub fn sniff(value: &str) -> Self {
        let head = value.trim_start();
        if head.is_empty() {
            return DataType::Empty;
        }
        if value.len() <= 32 {
            let trimmed = head.trim_end();
            if trimmed == "true" || trimmed == "false" {
                return DataType::Boolean;
            }
            if trimmed.parse::<f64>().is_ok() {
                return DataType::Number;
            }
        }
        if head.starts_with('{') || head.starts_with('[') {
            return DataType::Json;
        }
        if head.starts_with("data:") || looks_like_base64(head) {
            return DataType::Binary;
        }
        DataType::Text
    }

    pub(crate) fn index(&self) -> usize {
        *self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Empty => "empty",
            DataType::Boolean => "boolean",
            DataType::Number => "number",
            DataType::Json => "json",
            DataType::Binary => "binary",
            DataType::Text => "text",
        }
    }
}

fn looks_like_base64(value: &str) -> bool {
    value.len() >= SNIFF_PREFIX
        && value.as_bytes()[..SNIFF_PREFIX]
            .iter()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'='))
}

// == Fingerprint ==
/// Memoization key for engine decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Fingerprint {
    pub size: SizeBucket,
    pub ttl: TtlBucket,
    pub data_type: DataType,
}

impl Fingerprint {
    pub fn new(size: SizeBucket, ttl: TtlBucket, data_type: DataType) -> Self {
        Self {
            size,
            ttl,
            data_type,
        }
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.size.as_str(),
            self.ttl.as_str(),
            self.data_type.as_str()
        )
    }
}
