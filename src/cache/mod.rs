//! Cache Module
//!
//! Two-tier TTL caching: an ephemeral in-memory store and a durable store
//! persisted through a pluggable medium, fronted by [`DataCache`].

mod clock;
mod data_cache;
mod durable;
mod entry;
pub mod keys;
mod stats;
mod store;


use std::time::Duration;

// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use data_cache::{Backend, DataCache};
pub use durable::{DurableStore, FileMedium, Medium, MemoryMedium, DURABLE_PREFIX};
pub use entry::{is_live, CacheEntry};
pub use stats::CacheStats;
pub use store::MemoryStore;

// == Public Constants ==
/// TTL applied when a caller does not give one
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Ephemeral entry count above which `set` sweeps expired entries inline
pub const DEFAULT_SWEEP_THRESHOLD: usize = 1000;

// == TTL Tiers ==
pub const TTL_SHORT: Duration = Duration::from_secs(2 * 60);
pub const TTL_MEDIUM: Duration = Duration::from_secs(5 * 60);
pub const TTL_LONG: Duration = Duration::from_secs(15 * 60);
pub const TTL_VERY_LONG: Duration = Duration::from_secs(60 * 60);
