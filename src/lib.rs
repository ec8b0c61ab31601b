//! Snippet Cache - client-side TTL caching for the snippet platform
//!
//! Provides an ephemeral and a durable TTL store, read-through memoization,
//! a periodic sweep, and a small HTTP surface for inspecting a live cache.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{Backend, DataCache};
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::CleanupTask;
