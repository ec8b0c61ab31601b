//! Memory Store Module
//!
//! Ephemeral backend: a HashMap of TTL-tagged entries, cleared on restart.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cache::entry::{is_live, resolve_ttl_ms};
use crate::cache::{CacheEntry, CacheStats, Clock, DEFAULT_SWEEP_THRESHOLD};

// == Memory Store ==
/// In-memory cache storage with lazy and swept TTL expiration.
#[derive(Debug)]
pub struct MemoryStore<T> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<T>>,
    /// Performance statistics
    stats: CacheStats,
    /// TTL for entries stored without an explicit one
    default_ttl: Duration,
    /// Entry count above which `set` sweeps expired entries inline
    sweep_threshold: usize,
    /// Time source
    clock: Arc<dyn Clock>,
}

impl<T: Clone> MemoryStore<T> {
    // == Constructor ==
    /// Creates an empty store.
    ///
    /// # Arguments
    /// * `default_ttl` - TTL for entries stored without an explicit one
    /// * `clock` - Time source used for insertion and expiry checks
    pub fn new(default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
            default_ttl,
            sweep_threshold: DEFAULT_SWEEP_THRESHOLD,
            clock,
        }
    }

    /// Sets the entry count above which `set` runs an inline sweep.
    pub fn with_sweep_threshold(mut self, sweep_threshold: usize) -> Self {
        self.sweep_threshold = sweep_threshold;
        self
    }

    // == Set ==
    /// Stores a key-value pair with optional TTL.
    ///
    /// If the key already exists, the value is overwritten and its age reset.
    /// When the store grows past the sweep threshold, expired entries are
    /// purged before returning.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl` - Optional TTL (uses default_ttl if None or zero)
    pub fn set(&mut self, key: impl Into<String>, value: T, ttl: Option<Duration>) {
        let ttl_ms = resolve_ttl_ms(ttl, self.default_ttl);
        let entry = CacheEntry::new(value, self.clock.now_ms(), ttl_ms);
        self.entries.insert(key.into(), entry);

        if self.entries.len() > self.sweep_threshold {
            let removed = self.cleanup_expired();
            debug!(
                "Store above sweep threshold ({}), removed {} expired entries",
                self.sweep_threshold, removed
            );
        }

        self.stats.set_total_entries(self.entries.len());
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns the value if found and live. Expired entries are removed and
    /// counted as misses.
    pub fn get(&mut self, key: &str) -> Option<T> {
        let now = self.clock.now_ms();

        let live = match self.entries.get(key) {
            Some(entry) => is_live(entry, now),
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        if !live {
            self.entries.remove(key);
            self.stats.record_expirations(1);
            self.stats.record_miss();
            self.stats.set_total_entries(self.entries.len());
            debug!("Memory cache entry expired: {}", key);
            return None;
        }

        self.stats.record_hit();
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    // == Has ==
    /// Returns true if `key` holds a live value.
    ///
    /// Not a peek: an expired entry is removed, exactly as `get` would.
    pub fn has(&mut self, key: &str) -> bool {
        self.get(key).is_some()
    }

    // == Delete ==
    /// Removes an entry by key, returning whether one was present.
    pub fn delete(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    // == Clear ==
    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.stats.set_total_entries(0);
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the store.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let before = self.entries.len();

        self.entries.retain(|_, entry| is_live(entry, now));

        let removed = before - self.entries.len();
        self.stats.record_expirations(removed);
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    // == Invalidate ==
    /// Removes every entry whose key contains `pattern`.
    ///
    /// An empty pattern matches every key. Returns the number removed.
    pub fn invalidate(&mut self, pattern: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.contains(pattern));
        self.stats.set_total_entries(self.entries.len());
        before - self.entries.len()
    }

    // == Contains Raw ==
    /// Checks the underlying map for `key` without any expiry logic.
    pub fn contains_raw(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    // == Length ==
    /// Returns the number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;

    const DEFAULT_TTL: Duration = Duration::from_secs(300);

    fn test_store() -> (MemoryStore<String>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let store = MemoryStore::new(DEFAULT_TTL, clock.clone());
        (store, clock)
    }

    #[test]
    fn test_store_new() {
        let (store, _) = test_store();
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
        assert_eq!(store.default_ttl(), DEFAULT_TTL);
    }

    #[test]
    fn test_store_set_and_get() {
        let (mut store, _) = test_store();

        store.set("key1", "value1".to_string(), None);

        assert_eq!(store.get("key1").as_deref(), Some("value1"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let (mut store, _) = test_store();
        assert!(store.get("nonexistent").is_none());
    }

    #[test]
    fn test_store_delete() {
        let (mut store, _) = test_store();

        store.set("key1", "value1".to_string(), None);

        assert!(store.delete("key1"));
        assert!(store.is_empty());
        assert!(store.get("key1").is_none());
    }

    #[test]
    fn test_store_delete_is_idempotent() {
        let (mut store, _) = test_store();
        assert!(!store.delete("nonexistent"));
        assert!(!store.delete("nonexistent"));
    }

    #[test]
    fn test_store_overwrite_resets_age() {
        let (mut store, clock) = test_store();

        store.set("key1", "value1".to_string(), Some(Duration::from_secs(10)));
        clock.advance(Duration::from_secs(8));
        store.set("key1", "value2".to_string(), Some(Duration::from_secs(10)));
        clock.advance(Duration::from_secs(8));

        assert_eq!(store.get("key1").as_deref(), Some("value2"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_ttl_boundary() {
        let (mut store, clock) = test_store();

        store.set("key1", "value1".to_string(), Some(Duration::from_secs(1)));

        clock.advance(Duration::from_millis(1_000));
        assert!(store.get("key1").is_some(), "Live at exact TTL");

        clock.advance(Duration::from_millis(1));
        assert!(store.get("key1").is_none(), "Expired one ms past TTL");
        assert!(!store.contains_raw("key1"));
    }

    #[test]
    fn test_store_default_ttl_applies() {
        let (mut store, clock) = test_store();

        store.set("key1", "value1".to_string(), None);
        clock.advance(DEFAULT_TTL);
        assert!(store.get("key1").is_some());

        clock.advance(Duration::from_millis(1));
        assert!(store.get("key1").is_none());
    }

    #[test]
    fn test_has_evicts_expired_entry() {
        let (mut store, clock) = test_store();

        store.set("key1", "value1".to_string(), Some(Duration::from_secs(1)));
        clock.advance(Duration::from_secs(2));

        assert!(store.contains_raw("key1"));
        assert!(!store.has("key1"));
        assert!(!store.contains_raw("key1"));
    }

    #[test]
    fn test_store_clear() {
        let (mut store, _) = test_store();

        store.set("a", "1".to_string(), None);
        store.set("b", "2".to_string(), None);
        store.clear();

        assert!(store.get("a").is_none());
        assert!(store.get("b").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_stats() {
        let (mut store, clock) = test_store();

        store.set("key1", "value1".to_string(), None);
        store.set("short", "v".to_string(), Some(Duration::from_secs(1)));
        store.get("key1"); // hit
        store.get("nonexistent"); // miss
        clock.advance(Duration::from_secs(2));
        store.get("short"); // miss + expiration

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.total_entries, 1);
    }

    #[test]
    fn test_store_cleanup_expired() {
        let (mut store, clock) = test_store();

        store.set("a", "1".to_string(), Some(Duration::from_secs(1)));
        store.set("b", "2".to_string(), Some(Duration::from_secs(1)));
        store.set("c", "3".to_string(), Some(Duration::from_secs(100)));

        clock.advance(Duration::from_secs(2));

        assert_eq!(store.cleanup_expired(), 2);
        assert!(!store.contains_raw("a"));
        assert!(!store.contains_raw("b"));
        assert!(store.contains_raw("c"));
        assert_eq!(store.get("c").as_deref(), Some("3"));
    }

    #[test]
    fn test_sweep_threshold_purges_on_set() {
        let (store, clock) = test_store();
        let mut store = store.with_sweep_threshold(2);

        store.set("a", "1".to_string(), Some(Duration::from_secs(1)));
        store.set("b", "2".to_string(), Some(Duration::from_secs(100)));
        clock.advance(Duration::from_secs(5));

        store.set("c", "3".to_string(), None);

        assert!(!store.contains_raw("a"));
        assert!(store.contains_raw("b"));
        assert!(store.contains_raw("c"));
    }

    #[test]
    fn test_sweep_threshold_keeps_live_entries() {
        let (store, _) = test_store();
        let mut store = store.with_sweep_threshold(1);

        store.set("a", "1".to_string(), None);
        store.set("b", "2".to_string(), None);
        store.set("c", "3".to_string(), None);

        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_invalidate_by_pattern() {
        let (mut store, _) = test_store();

        store.set("code_detail_1", "x".to_string(), None);
        store.set("code_detail_2", "y".to_string(), None);
        store.set("tags", "z".to_string(), None);

        assert_eq!(store.invalidate("code_detail"), 2);
        assert!(store.get("code_detail_1").is_none());
        assert_eq!(store.get("tags").as_deref(), Some("z"));
    }

    #[test]
    fn test_invalidate_empty_pattern_clears() {
        let (mut store, _) = test_store();

        store.set("a", "1".to_string(), None);
        store.set("b", "2".to_string(), None);

        assert_eq!(store.invalidate(""), 2);
        assert!(store.is_empty());
    }
}
