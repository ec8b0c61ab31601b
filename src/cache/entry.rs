//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
///
/// The same shape is used in memory and as the durable record, so it
/// serializes to `{"value": ..., "stored_at": ..., "ttl_ms": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// The stored value
    pub value: T,
    /// Creation timestamp (Unix milliseconds)
    pub stored_at: u64,
    /// Time-to-live in milliseconds, already resolved against the default
    pub ttl_ms: u64,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates a new cache entry stored at `now_ms`.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `now_ms` - Insertion time in Unix milliseconds
    /// * `ttl_ms` - Resolved TTL in milliseconds
    pub fn new(value: T, now_ms: u64, ttl_ms: u64) -> Self {
        Self {
            value,
            stored_at: now_ms,
            ttl_ms,
        }
    }

    // == Expires At ==
    /// Last instant (inclusive) at which the entry is still live.
    pub fn expires_at(&self) -> u64 {
        self.stored_at.saturating_add(self.ttl_ms)
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, `0` once expired.
    pub fn ttl_remaining_ms(&self, now_ms: u64) -> u64 {
        self.expires_at().saturating_sub(now_ms)
    }
}

// == Liveness ==
/// Checks whether an entry is still live at `now_ms`.
///
/// Boundary condition: an entry read at exactly `stored_at + ttl` is live;
/// one millisecond later it is expired. A clock reading earlier than
/// `stored_at` counts as zero age.
pub fn is_live<T>(entry: &CacheEntry<T>, now_ms: u64) -> bool {
    now_ms.saturating_sub(entry.stored_at) <= entry.ttl_ms
}

// == TTL Resolution ==
/// Resolves a caller TTL against the store default, in milliseconds.
///
/// `None` and a zero duration both fall back to `default`; neither means
/// "never expires".
pub fn resolve_ttl_ms(ttl: Option<Duration>, default: Duration) -> u64 {
    let ttl = match ttl {
        Some(ttl) if !ttl.is_zero() => ttl,
        _ => default,
    };
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX)
}
