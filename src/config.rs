//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::path::PathBuf;

use crate::cache::DEFAULT_SWEEP_THRESHOLD;

/// Cache and server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Default TTL in seconds for entries without explicit TTL
    pub default_ttl: u64,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Ephemeral entry count above which `set` sweeps inline
    pub sweep_threshold: usize,
    /// Directory for durable records, None = platform cache directory
    pub durable_dir: Option<PathBuf>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 300)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 60)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `SWEEP_THRESHOLD` - Inline sweep threshold (default: 1000)
    /// - `DURABLE_DIR` - Durable cache directory (default: platform cache dir)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_ttl: parse_var("DEFAULT_TTL").unwrap_or(defaults.default_ttl),
            cleanup_interval: parse_var("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            sweep_threshold: parse_var("SWEEP_THRESHOLD").unwrap_or(defaults.sweep_threshold),
            durable_dir: env::var_os("DURABLE_DIR")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_ttl: 300,
            cleanup_interval: 60,
            server_port: 3000,
            sweep_threshold: DEFAULT_SWEEP_THRESHOLD,
            durable_dir: None,
        }
    }
}
