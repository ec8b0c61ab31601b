//! TTL Cleanup Task
//!
//! Background task that periodically removes expired ephemeral entries.

use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::DataCache;

/// Handle to a running sweep of a cache's ephemeral store.
///
/// Dropping the handle without calling [`CleanupTask::stop`] leaves the
/// sweep running until the runtime shuts down.
#[derive(Debug)]
pub struct CleanupTask {
    handle: JoinHandle<()>,
}

impl CleanupTask {
    /// Spawns a task that sweeps `cache` every `interval`.
    ///
    /// The first sweep happens one full interval after the start.
    ///
    /// # Example
    /// ```ignore
    /// let cache: DataCache<serde_json::Value> = DataCache::from_config(&config);
    /// let cleanup = CleanupTask::start(cache.clone(), Duration::from_secs(60));
    /// // Later, during shutdown:
    /// cleanup.stop();
    /// ```
    pub fn start<T>(cache: DataCache<T>, interval: Duration) -> Self
    where
        T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        let handle = tokio::spawn(async move {
            info!(
                "Starting TTL cleanup task with interval of {} seconds",
                interval.as_secs()
            );

            loop {
                tokio::time::sleep(interval).await;

                let removed = cache.cleanup().await;

                if removed > 0 {
                    info!("TTL cleanup: removed {} expired entries", removed);
                } else {
                    debug!("TTL cleanup: no expired entries found");
                }
            }
        });

        Self { handle }
    }

    /// Stops the sweep. An in-progress sweep is cut at its next await.
    pub fn stop(self) {
        self.handle.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}
