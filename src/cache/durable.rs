//! Durable Store Module
//!
//! Persisted backend. Each entry is one JSON record in an external keyspace
//! (a [`Medium`]), namespaced under [`DURABLE_PREFIX`]. Failures on this
//! path never reach the caller: writes that the medium rejects are logged
//! and dropped, and unreadable records are treated as misses.

use std::collections::HashMap;
use std::fmt::Debug;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::cache::entry::{is_live, resolve_ttl_ms};
use crate::cache::{CacheEntry, Clock};
use crate::error::{CacheError, Result};

// == Constants ==
/// Prefix separating cache records from unrelated keys in the same medium
pub const DURABLE_PREFIX: &str = "cache_";

/// Longest file name `FileMedium` will create
const MAX_FILE_NAME: usize = 255;

/// Longest key stored under its own name. Anything up to this length still
/// fits [`MAX_FILE_NAME`] with every byte percent-encoded; longer keys are
/// stored under a SHA-256 digest.
const MAX_PLAIN_KEY: usize = 80;

// == Medium Trait ==
/// A persistent string keyspace shared with other users.
pub trait Medium: Send + Sync + Debug {
    /// Returns the raw record at `key`, or `None` if absent.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Stores `raw` at `key`. On error the previous record must be intact.
    fn write(&self, key: &str, raw: &str) -> Result<()>;

    /// Removes `key`, returning whether it existed.
    fn remove(&self, key: &str) -> Result<bool>;

    /// Lists every key in the medium, cache-owned or not.
    fn keys(&self) -> Result<Vec<String>>;
}

// == Memory Medium ==
/// In-process medium with an optional byte quota.
///
/// Useful for tests and as a fallback when no cache directory exists.
#[derive(Debug, Default)]
pub struct MemoryMedium {
    records: Mutex<HashMap<String, String>>,
    /// Maximum total bytes of keys plus records, None = unbounded
    quota_bytes: Option<usize>,
}

impl MemoryMedium {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a medium that rejects writes pushing it past `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, String>>> {
        self.records
            .lock()
            .map_err(|_| CacheError::Internal("medium lock poisoned".to_string()))
    }
}

impl Medium for MemoryMedium {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn write(&self, key: &str, raw: &str) -> Result<()> {
        let mut records = self.lock()?;

        if let Some(quota) = self.quota_bytes {
            let used: usize = records
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = used + key.len() + raw.len();
            if needed > quota {
                return Err(CacheError::QuotaExceeded(format!(
                    "{} bytes needed, quota is {}",
                    needed, quota
                )));
            }
        }

        records.insert(key.to_string(), raw.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.lock()?.remove(key).is_some())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.lock()?.keys().cloned().collect())
    }
}

// == File Medium ==
/// Directory-backed medium: one `<encoded key>.json` file per key.
#[derive(Debug, Clone)]
pub struct FileMedium {
    /// Directory where records are stored
    dir: PathBuf,
}

impl FileMedium {
    /// Creates a medium rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Uses the platform cache directory (`~/.cache/snippet-cache` on Linux).
    ///
    /// Returns `None` when no home directory can be determined.
    pub fn default_location() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "snippet-cache")?;
        Some(Self::new(project_dirs.cache_dir()))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, key: &str) -> Result<PathBuf> {
        let file_name = format!("{}.json", encode_file_stem(key));
        if file_name.len() > MAX_FILE_NAME {
            return Err(CacheError::Storage(std::io::Error::new(
                ErrorKind::InvalidInput,
                format!("file name for key '{}' exceeds {} bytes", key, MAX_FILE_NAME),
            )));
        }
        Ok(self.dir.join(file_name))
    }
}

impl Medium for FileMedium {
    fn read(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.record_path(key)?) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, raw: &str) -> Result<()> {
        let path = self.record_path(key)?;
        fs::create_dir_all(&self.dir)?;

        // Every writer stages its own file, so the rename only ever swaps
        // one complete record for another
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(raw.as_bytes())?;
        tmp.persist(&path).map_err(|e| CacheError::Storage(e.error))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        match fs::remove_file(self.record_path(key)?) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> Result<Vec<String>> {
        let dir = match fs::read_dir(&self.dir) {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        for item in dir {
            let name = item?.file_name();
            let Some(stem) = name.to_str().and_then(|n| n.strip_suffix(".json")) else {
                continue;
            };
            if let Some(key) = decode_file_stem(stem) {
                keys.push(key);
            }
        }
        Ok(keys)
    }
}

// == File Name Encoding ==
/// Percent-encodes every byte outside `[A-Za-z0-9_-]`.
fn encode_file_stem(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}

/// Reverses [`encode_file_stem`]. Returns `None` for names it did not produce,
/// so the mapping stays one-to-one.
fn decode_file_stem(stem: &str) -> Option<String> {
    let bytes = stem.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = stem.get(i + 1..i + 3)?;
            if !hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'A'..=b'F')) {
                return None;
            }
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

// == Durable Store ==
/// TTL store persisted through a [`Medium`].
///
/// Expiry is checked lazily on read; this backend is never swept.
#[derive(Debug)]
pub struct DurableStore {
    medium: Arc<dyn Medium>,
    /// TTL for entries stored without an explicit one
    default_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl DurableStore {
    // == Constructor ==
    pub fn new(medium: Arc<dyn Medium>, default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            medium,
            default_ttl,
            clock,
        }
    }

    fn namespaced(key: &str) -> String {
        if key.len() > MAX_PLAIN_KEY {
            let digest = hex::encode(Sha256::digest(key.as_bytes()));
            format!("{}sha256_{}", DURABLE_PREFIX, digest)
        } else {
            format!("{}{}", DURABLE_PREFIX, key)
        }
    }

    // == Set ==
    /// Persists `value` under `key`.
    ///
    /// A rejected write (quota, I/O, serialization) is logged and swallowed;
    /// whatever was stored before stays in place.
    pub fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Option<Duration>) {
        if let Err(e) = self.try_set(key, value, ttl) {
            warn!("Durable cache set failed for '{}': {}", key, e);
        }
    }

    /// Like [`DurableStore::set`] but reports the failure.
    pub fn try_set<T: Serialize>(&self, key: &str, value: &T, ttl: Option<Duration>) -> Result<()> {
        let ttl_ms = resolve_ttl_ms(ttl, self.default_ttl);
        let entry = CacheEntry::new(value, self.clock.now_ms(), ttl_ms);
        let raw = serde_json::to_string(&entry)?;
        self.medium.write(&Self::namespaced(key), &raw)
    }

    // == Get ==
    /// Returns the live value at `key`.
    ///
    /// Expired records are removed. Missing, unreadable, or undecodable
    /// records all yield `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entry = match self.load::<T>(key) {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(e) => {
                warn!("Durable cache get failed for '{}': {}", key, e);
                return None;
            }
        };

        if is_live(&entry, self.clock.now_ms()) {
            Some(entry.value)
        } else {
            debug!("Durable cache entry expired: {}", key);
            self.delete(key);
            None
        }
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<CacheEntry<T>>> {
        match self.medium.read(&Self::namespaced(key))? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    // == Has ==
    /// Returns true if `key` decodes to a live `T`. Removes it if expired.
    pub fn has<T: DeserializeOwned>(&self, key: &str) -> bool {
        self.get::<T>(key).is_some()
    }

    // == Delete ==
    /// Removes `key`, returning whether a record was present.
    pub fn delete(&self, key: &str) -> bool {
        match self.medium.remove(&Self::namespaced(key)) {
            Ok(removed) => removed,
            Err(e) => {
                warn!("Durable cache delete failed for '{}': {}", key, e);
                false
            }
        }
    }

    // == Clear ==
    /// Removes every cache-owned record; foreign keys are untouched.
    pub fn clear(&self) {
        for key in self.cache_keys() {
            if let Err(e) = self.medium.remove(&key) {
                warn!("Durable cache clear failed for '{}': {}", key, e);
            }
        }
    }

    /// Number of cache-owned records, expired ones included.
    pub fn len(&self) -> usize {
        self.cache_keys().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cache_keys(&self) -> Vec<String> {
        match self.medium.keys() {
            Ok(keys) => keys
                .into_iter()
                .filter(|k| k.starts_with(DURABLE_PREFIX))
                .collect(),
            Err(e) => {
                warn!("Durable cache key listing failed: {}", e);
                Vec::new()
            }
        }
    }
}
