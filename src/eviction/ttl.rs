//! TTL Strategy Module
//!
//! Evicts whichever timed key is closest to expiring.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use super::{Counters, EvictionStats, EvictionStrategy, KeyList};
use crate::cache::{Clock, SystemClock};

// == TTL Strategy ==
/// Victim = smallest remaining TTL.
///
/// Keys written without a TTL are only nominated once no timed key remains,
/// oldest insertion first. Deadlines are absolute times on the clock the
/// strategy was built with, so they line up with the engine's `expires_at`.
#[derive(Debug, Clone)]
pub struct TtlStrategy {
    clock: Arc<dyn Clock>,
    deadlines: BTreeSet<(u64, u64, String)>,
    timed: HashMap<String, (u64, u64)>,
    untimed: KeyList,
    seq: u64,
    counters: Counters,
}

impl Default for TtlStrategy {
    fn default() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }
}

impl TtlStrategy {
    pub const NAME: &'static str = "ttl";

    pub fn new() -> Self {
        Self::default()
    }

    /// Strategy whose deadlines are measured on `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            deadlines: BTreeSet::new(),
            timed: HashMap::new(),
            untimed: KeyList::new(),
            seq: 0,
            counters: Counters::default(),
        }
    }

    fn forget(&mut self, key: &str) -> bool {
        if let Some((deadline, seq)) = self.timed.remove(key) {
            self.deadlines.remove(&(deadline, seq, key.to_string()));
            return true;
        }
        self.untimed.remove(key)
    }

    fn contains(&self, key: &str) -> bool {
        self.timed.contains_key(key) || self.untimed.contains(key)
    }
}

impl EvictionStrategy for TtlStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn record_access(&mut self, key: &str) {
        if self.contains(key) {
            self.counters.accesses += 1;
        }
    }

    fn record_add(&mut self, key: &str, ttl: Option<Duration>) {
        self.forget(key);
        self.counters.additions += 1;
        match ttl {
            Some(ttl) => {
                let deadline = self
                    .clock
                    .now_ms()
                    .saturating_add(ttl.as_millis() as u64);
                self.seq += 1;
                self.deadlines.insert((deadline, self.seq, key.to_string()));
                self.timed.insert(key.to_string(), (deadline, self.seq));
            }
            None => {
                self.untimed.push_front(key);
            }
        }
    }

    fn eviction_key(&mut self) -> Option<String> {
        match self.deadlines.first() {
            Some((_, _, key)) => Some(key.clone()),
            None => self.untimed.back().map(str::to_string),
        }
    }

    fn remove_key(&mut self, key: &str) {
        if self.forget(key) {
            self.counters.removals += 1;
        }
    }

    fn clear(&mut self) {
        self.deadlines.clear();
        self.timed.clear();
        self.untimed.clear();
    }

    fn len(&self) -> usize {
        self.timed.len() + self.untimed.len()
    }

    fn stats(&self) -> EvictionStats {
        self.counters.snapshot(Self::NAME, self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;

    #[test]
    fn test_ttl_shortest_remaining_first() {
        let mut ttl = TtlStrategy::new();
        ttl.record_add("long", Some(Duration::from_secs(600)));
        ttl.record_add("short", Some(Duration::from_secs(5)));
        ttl.record_add("mid", Some(Duration::from_secs(60)));

        assert_eq!(ttl.eviction_key(), Some("short".to_string()));
        ttl.remove_key("short");
        assert_eq!(ttl.eviction_key(), Some("mid".to_string()));
    }

    #[test]
    fn test_ttl_untimed_only_after_timed() {
        let mut ttl = TtlStrategy::new();
        ttl.record_add("forever", None);
        ttl.record_add("soon", Some(Duration::from_secs(3600)));

        assert_eq!(ttl.eviction_key(), Some("soon".to_string()));
        ttl.remove_key("soon");
        assert_eq!(ttl.eviction_key(), Some("forever".to_string()));
    }

    #[test]
    fn test_ttl_overwrite_replaces_deadline() {
        let mut ttl = TtlStrategy::new();
        ttl.record_add("a", Some(Duration::from_secs(1)));
        ttl.record_add("b", Some(Duration::from_secs(100)));
        ttl.record_add("a", None);

        assert_eq!(ttl.len(), 2);
        assert_eq!(ttl.eviction_key(), Some("b".to_string()));
    }

    #[test]
    fn test_ttl_unknown_key_noop() {
        let mut ttl = TtlStrategy::new();
        ttl.record_access("ghost");
        ttl.remove_key("ghost");
        assert_eq!(ttl.stats().removals, 0);
        assert_eq!(ttl.eviction_key(), None);
    }

    #[test]
    fn test_ttl_deadline_uses_clock_time() {
        let clock = ManualClock::new(0);
        let mut ttl = TtlStrategy::with_clock(Arc::new(clock.clone()));

        ttl.record_add("a", Some(Duration::from_millis(1_000)));
        clock.advance(Duration::from_millis(900));
        ttl.record_add("b", Some(Duration::from_millis(500)));

        // a has 100ms left, b has 500ms
        assert_eq!(ttl.eviction_key(), Some("a".to_string()));
    }
}
