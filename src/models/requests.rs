//! Request DTOs for the cache HTTP surface
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;
use serde_json::Value;

use crate::cache::Backend;

/// Maximum accepted key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Request body for the SET operation (PUT /set)
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: Any JSON value
/// - `ttl`: Optional TTL in seconds (uses default if not specified)
/// - `durable`: Store in the durable backend instead of memory
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    pub key: String,
    pub value: Value,
    #[serde(default)]
    pub ttl: Option<u64>,
    #[serde(default)]
    pub durable: bool,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_key(&self.key)
    }

    pub fn backend(&self) -> Backend {
        backend_for(self.durable)
    }
}

/// Validates a key taken from a body or path.
pub fn validate_key(key: &str) -> Option<String> {
    if key.is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    if key.len() > MAX_KEY_LENGTH {
        return Some(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        ));
    }
    None
}

/// `?durable=true` selector shared by get, delete and clear.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackendQuery {
    #[serde(default)]
    pub durable: bool,
}

impl BackendQuery {
    pub fn backend(&self) -> Backend {
        backend_for(self.durable)
    }
}

/// Query for DELETE /invalidate
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvalidateQuery {
    /// Substring to match; empty matches everything
    #[serde(default)]
    pub pattern: String,
}

fn backend_for(durable: bool) -> Backend {
    if durable {
        Backend::Durable
    } else {
        Backend::Ephemeral
    }
}
