//! Data Cache Module
//!
//! Facade over both backends with read-through memoization.
//!
//! Durable operations touch the medium synchronously, so they run on the
//! blocking thread pool rather than on the async workers.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::cache::{
    CacheStats, Clock, DurableStore, FileMedium, Medium, MemoryMedium, MemoryStore, SystemClock,
};
use crate::config::Config;

// == Backend ==
/// Which store an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// In-memory, lost on restart, swept periodically
    #[default]
    Ephemeral,
    /// Persisted through the medium, expired lazily on read
    Durable,
}

// == Data Cache ==
/// Shared handle to an ephemeral and a durable store.
///
/// Cloning is cheap; clones share the same stores.
#[derive(Debug)]
pub struct DataCache<T> {
    memory: Arc<RwLock<MemoryStore<T>>>,
    durable: Arc<DurableStore>,
}

impl<T> Clone for DataCache<T> {
    fn clone(&self) -> Self {
        Self {
            memory: Arc::clone(&self.memory),
            durable: Arc::clone(&self.durable),
        }
    }
}

impl<T> DataCache<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    // == Constructor ==
    pub fn new(memory: MemoryStore<T>, durable: DurableStore) -> Self {
        Self {
            memory: Arc::new(RwLock::new(memory)),
            durable: Arc::new(durable),
        }
    }

    /// Builds both stores on the given medium and clock.
    pub fn with_medium(
        medium: Arc<dyn Medium>,
        default_ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let memory = MemoryStore::new(default_ttl, clock.clone());
        let durable = DurableStore::new(medium, default_ttl, clock);
        Self::new(memory, durable)
    }

    /// Creates a cache from configuration, on the system clock.
    ///
    /// The durable store uses `config.durable_dir`, else the platform cache
    /// directory, else an in-memory medium.
    pub fn from_config(config: &Config) -> Self {
        let default_ttl = Duration::from_secs(config.default_ttl);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let medium: Arc<dyn Medium> = match config
            .durable_dir
            .clone()
            .map(FileMedium::new)
            .or_else(FileMedium::default_location)
        {
            Some(files) => {
                debug!("Durable cache directory: {}", files.dir().display());
                Arc::new(files)
            }
            None => {
                warn!("No cache directory available, durable cache will not persist");
                Arc::new(MemoryMedium::new())
            }
        };

        let memory = MemoryStore::new(default_ttl, clock.clone())
            .with_sweep_threshold(config.sweep_threshold);
        let durable = DurableStore::new(medium, default_ttl, clock);
        Self::new(memory, durable)
    }

    /// Runs `op` against the durable store on the blocking pool.
    ///
    /// Returns `None` if the task panicked or was cancelled.
    async fn run_durable<R, F>(&self, name: &str, op: F) -> Option<R>
    where
        F: FnOnce(&DurableStore) -> R + Send + 'static,
        R: Send + 'static,
    {
        let durable = Arc::clone(&self.durable);
        match tokio::task::spawn_blocking(move || op(&durable)).await {
            Ok(result) => Some(result),
            Err(e) => {
                warn!("Durable cache {} task failed: {}", name, e);
                None
            }
        }
    }

    // == Set ==
    /// Stores `value` under `key` in `backend`.
    pub async fn set(&self, backend: Backend, key: &str, value: T, ttl: Option<Duration>) {
        match backend {
            Backend::Ephemeral => self.memory.write().await.set(key, value, ttl),
            Backend::Durable => {
                let key = key.to_string();
                self.run_durable("set", move |durable| durable.set(&key, &value, ttl))
                    .await;
            }
        }
    }

    // == Get ==
    /// Returns the live value at `key`, removing it if expired.
    pub async fn get(&self, backend: Backend, key: &str) -> Option<T> {
        match backend {
            Backend::Ephemeral => self.memory.write().await.get(key),
            Backend::Durable => {
                let key = key.to_string();
                self.run_durable("get", move |durable| durable.get::<T>(&key))
                    .await
                    .flatten()
            }
        }
    }

    // == Has ==
    pub async fn has(&self, backend: Backend, key: &str) -> bool {
        self.get(backend, key).await.is_some()
    }

    // == Delete ==
    pub async fn delete(&self, backend: Backend, key: &str) -> bool {
        match backend {
            Backend::Ephemeral => self.memory.write().await.delete(key),
            Backend::Durable => {
                let key = key.to_string();
                self.run_durable("delete", move |durable| durable.delete(&key))
                    .await
                    .unwrap_or(false)
            }
        }
    }

    // == Clear ==
    pub async fn clear(&self, backend: Backend) {
        match backend {
            Backend::Ephemeral => self.memory.write().await.clear(),
            Backend::Durable => {
                self.run_durable("clear", |durable| durable.clear()).await;
            }
        }
    }

    // == Cache Request ==
    /// Returns the cached value for `key`, or runs `producer` and caches its
    /// result.
    ///
    /// A producer error is returned unchanged and nothing is cached. There is
    /// no single-flight: concurrent misses on one key each run their
    /// producer, and the last to finish wins.
    pub async fn cache_request<F, Fut, E>(
        &self,
        backend: Backend,
        key: &str,
        ttl: Option<Duration>,
        producer: F,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(cached) = self.get(backend, key).await {
            debug!("Cache hit: {}", key);
            return Ok(cached);
        }

        debug!("Cache miss: {}", key);
        let value = producer().await?;

        self.set(backend, key, value.clone(), ttl).await;
        debug!("Cache set: {}", key);
        Ok(value)
    }

    // == Cleanup ==
    /// Sweeps expired entries from the ephemeral store. Returns the count removed.
    pub async fn cleanup(&self) -> usize {
        self.memory.write().await.cleanup_expired()
    }

    // == Invalidate ==
    /// Removes ephemeral entries whose key contains `pattern`.
    pub async fn invalidate(&self, pattern: &str) -> usize {
        let removed = self.memory.write().await.invalidate(pattern);
        debug!("Invalidated {} entries matching '{}'", removed, pattern);
        removed
    }

    // == Stats ==
    /// Ephemeral store statistics.
    pub async fn stats(&self) -> CacheStats {
        self.memory.read().await.stats()
    }

    /// Number of durable records, expired ones included.
    pub async fn durable_len(&self) -> usize {
        self.run_durable("len", |durable| durable.len())
            .await
            .unwrap_or(0)
    }

    /// Shared handle to the ephemeral store.
    pub fn memory(&self) -> &Arc<RwLock<MemoryStore<T>>> {
        &self.memory
    }

    pub fn durable(&self) -> &DurableStore {
        &self.durable
    }
}
