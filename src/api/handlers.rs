//! API Handlers
//!
//! HTTP request handlers for inspecting and driving a cache instance.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;

use crate::cache::{Backend, DataCache};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    validate_key, BackendQuery, ClearResponse, DeleteResponse, GetResponse, HealthResponse,
    InvalidateQuery, RemovedResponse, SetRequest, SetResponse, StatsResponse,
};

/// Application state shared across all handlers.
///
/// The cache handle is internally reference-counted and locked, so cloning
/// the state shares one cache.
#[derive(Clone)]
pub struct AppState {
    pub cache: DataCache<Value>,
}

impl AppState {
    pub fn new(cache: DataCache<Value>) -> Self {
        Self { cache }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(DataCache::from_config(config))
    }
}

/// Handler for PUT /set
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let ttl = req.ttl.map(std::time::Duration::from_secs);
    state.cache.set(req.backend(), &req.key, req.value, ttl).await;

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /get/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<BackendQuery>,
) -> Result<Json<GetResponse>> {
    if let Some(error_msg) = validate_key(&key) {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    match state.cache.get(query.backend(), &key).await {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for DELETE /del/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<BackendQuery>,
) -> Result<Json<DeleteResponse>> {
    if let Some(error_msg) = validate_key(&key) {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let removed = state.cache.delete(query.backend(), &key).await;
    Ok(Json(DeleteResponse::new(key, removed)))
}

/// Handler for DELETE /invalidate
///
/// Removes ephemeral entries whose key contains `pattern`.
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Query(query): Query<InvalidateQuery>,
) -> Json<RemovedResponse> {
    let removed = state.cache.invalidate(&query.pattern).await;
    Json(RemovedResponse { removed })
}

/// Handler for DELETE /clear
pub async fn clear_handler(
    State(state): State<AppState>,
    Query(query): Query<BackendQuery>,
) -> Json<ClearResponse> {
    let backend = query.backend();
    state.cache.clear(backend).await;

    let name = match backend {
        Backend::Ephemeral => "Ephemeral",
        Backend::Durable => "Durable",
    };
    Json(ClearResponse::new(name))
}

/// Handler for POST /cleanup
///
/// Runs one sweep immediately instead of waiting for the background task.
pub async fn cleanup_handler(State(state): State<AppState>) -> Json<RemovedResponse> {
    let removed = state.cache.cleanup().await;
    Json(RemovedResponse { removed })
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.cache.stats().await;
    let durable_entries = state.cache.durable_len().await;

    Json(StatsResponse::new(&stats, durable_entries))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::cache::{ManualClock, MemoryMedium};

    fn test_state() -> (AppState, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(0));
        let cache = DataCache::with_medium(
            Arc::new(MemoryMedium::new()),
            Duration::from_secs(300),
            clock.clone(),
        );
        (AppState::new(cache), clock)
    }

    fn set_request(key: &str, ttl: Option<u64>, durable: bool) -> SetRequest {
        SetRequest {
            key: key.to_string(),
            value: serde_json::json!({"title": "hello"}),
            ttl,
            durable,
        }
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let (state, _) = test_state();

        let result = set_handler(State(state.clone()), Json(set_request("k", None, false))).await;
        assert!(result.is_ok());

        let response = get_handler(
            State(state),
            Path("k".to_string()),
            Query(BackendQuery::default()),
        )
        .await
        .unwrap();
        assert_eq!(response.value["title"], "hello");
    }

    #[tokio::test]
    async fn test_get_expired_is_not_found() {
        let (state, clock) = test_state();

        set_handler(State(state.clone()), Json(set_request("k", Some(1), false)))
            .await
            .unwrap();
        clock.advance(Duration::from_secs(2));

        let result = get_handler(
            State(state),
            Path("k".to_string()),
            Query(BackendQuery::default()),
        )
        .await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_durable_set_and_get() {
        let (state, _) = test_state();

        set_handler(State(state.clone()), Json(set_request("d", None, true)))
            .await
            .unwrap();

        let durable = get_handler(
            State(state.clone()),
            Path("d".to_string()),
            Query(BackendQuery { durable: true }),
        )
        .await;
        assert!(durable.is_ok());

        let ephemeral = get_handler(
            State(state),
            Path("d".to_string()),
            Query(BackendQuery::default()),
        )
        .await;
        assert!(ephemeral.is_err());
    }

    #[tokio::test]
    async fn test_delete_handler() {
        let (state, _) = test_state();

        set_handler(State(state.clone()), Json(set_request("gone", None, false)))
            .await
            .unwrap();

        let first = delete_handler(
            State(state.clone()),
            Path("gone".to_string()),
            Query(BackendQuery::default()),
        )
        .await
        .unwrap();
        assert!(first.removed);

        let second = delete_handler(
            State(state),
            Path("gone".to_string()),
            Query(BackendQuery::default()),
        )
        .await
        .unwrap();
        assert!(!second.removed);
    }

    #[tokio::test]
    async fn test_delete_rejects_overlong_key() {
        let (state, _) = test_state();

        let result = delete_handler(
            State(state),
            Path("k".repeat(300)),
            Query(BackendQuery { durable: true }),
        )
        .await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_invalidate_handler() {
        let (state, _) = test_state();

        for key in ["code_detail_1", "code_detail_2", "tags"] {
            set_handler(State(state.clone()), Json(set_request(key, None, false)))
                .await
                .unwrap();
        }

        let response = invalidate_handler(
            State(state.clone()),
            Query(InvalidateQuery {
                pattern: "code_detail".to_string(),
            }),
        )
        .await;
        assert_eq!(response.removed, 2);
        assert_eq!(state.cache.stats().await.total_entries, 1);
    }

    #[tokio::test]
    async fn test_cleanup_handler() {
        let (state, clock) = test_state();

        set_handler(State(state.clone()), Json(set_request("short", Some(1), false)))
            .await
            .unwrap();
        set_handler(State(state.clone()), Json(set_request("long", Some(100), false)))
            .await
            .unwrap();
        clock.advance(Duration::from_secs(2));

        let response = cleanup_handler(State(state)).await;
        assert_eq!(response.removed, 1);
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let (state, _) = test_state();

        set_handler(State(state.clone()), Json(set_request("d", None, true)))
            .await
            .unwrap();

        let response = stats_handler(State(state)).await;
        assert_eq!(response.hits, 0);
        assert_eq!(response.misses, 0);
        assert_eq!(response.durable_entries, 1);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }

    #[tokio::test]
    async fn test_set_invalid_request() {
        let (state, _) = test_state();

        let result = set_handler(State(state), Json(set_request("", None, false))).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }
}
