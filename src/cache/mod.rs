//! Cache Module
//!
//! Shared building blocks: entries, clocks, the expiration heap and statistics.

mod clock;
mod entry;
mod heap;
mod stats;


// Re-export public types
pub use clock::{current_timestamp_ms, Clock, ManualClock, SystemClock};
pub use entry::{entry_size, CacheEntry, EntryMeta};
pub use heap::{HeapNode, MinHeap};
pub use stats::CacheStats;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Default per-engine byte budget (5 MiB)
pub const DEFAULT_MAX_SIZE: u64 = 5 * 1024 * 1024;
