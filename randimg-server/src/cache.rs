//! Response cache
//!
//! Memoizes JSON responses of read routes keyed by the exact request path and
//! query string. Entries expire after a TTL and are swept periodically.
//! Write routes clear the whole cache once they complete.

use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use tokio::task::JoinHandle;

use crate::error::ApiError;

struct CachedResponse {
    body: Bytes,
    expires_at: Instant,
}

/// TTL cache of serialized JSON response bodies
pub struct ResponseCache {
    entries: DashMap<String, CachedResponse>,
    default_ttl: Duration,
}

impl ResponseCache {
    /// Create an empty cache whose entries live `default_ttl` unless told otherwise
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl,
        }
    }

    /// Get a live entry
    pub fn get(&self, key: &str) -> Option<Bytes> {
        let entry = self.entries.get(key)?;
        if entry.expires_at > Instant::now() {
            Some(entry.body.clone())
        } else {
            None // Expired
        }
    }

    /// Store a body under `key` for `ttl`, or the default TTL
    pub fn insert(&self, key: impl Into<String>, body: Bytes, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(self.default_ttl);
        self.entries.insert(
            key.into(),
            CachedResponse {
                body,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Remove expired entries (called periodically)
    pub fn cleanup_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.expires_at > now);
    }

    /// Number of stored entries, expired ones included until swept
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sweep expired entries every `period` until the cache is dropped
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let cache: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                match cache.upgrade() {
                    Some(cache) => cache.cleanup_expired(),
                    None => break,
                }
            }
        })
    }
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("entries", &self.entries.len())
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

/// Cache handle plus the TTL applied to one group of read routes
#[derive(Clone)]
pub struct CachePolicy {
    cache: Arc<ResponseCache>,
    ttl: Option<Duration>,
}

impl CachePolicy {
    /// Cache with the cache's default TTL
    pub fn new(cache: Arc<ResponseCache>) -> Self {
        Self { cache, ttl: None }
    }

    /// Cache with a route-specific TTL
    pub fn with_ttl(cache: Arc<ResponseCache>, ttl: Duration) -> Self {
        Self {
            cache,
            ttl: Some(ttl),
        }
    }
}

fn cache_key(request: &Request) -> String {
    request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string())
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"))
}

/// Middleware serving read routes from the cache
///
/// Only successful JSON responses are stored.
pub async fn cache_response(
    State(policy): State<CachePolicy>,
    request: Request,
    next: Next,
) -> Response {
    let key = cache_key(&request);

    if let Some(body) = policy.cache.get(&key) {
        tracing::debug!(key = %key, "Response cache hit");
        return (
            StatusCode::OK,
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            )],
            body,
        )
            .into_response();
    }

    let response = next.run(request).await;
    if !response.status().is_success() || !is_json(&response) {
        return response;
    }

    let (parts, body) = response.into_parts();
    match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => {
            tracing::debug!(key = %key, "Response cache store");
            policy.cache.insert(key, bytes.clone(), policy.ttl);
            Response::from_parts(parts, Body::from(bytes))
        }
        Err(e) => ApiError::internal(format!("Failed to buffer response body: {e}")).into_response(),
    }
}

/// Middleware clearing the cache after a write request completes
pub async fn invalidate_cache(
    State(cache): State<Arc<ResponseCache>>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    cache.clear();
    tracing::debug!(status = %response.status(), "Response cache cleared");
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::{middleware, routing::get, Json, Router};
    use tower::ServiceExt;

    #[test]
    fn test_insert_and_get() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        cache.insert("/images", Bytes::from_static(b"{}"), None);

        assert_eq!(cache.get("/images"), Some(Bytes::from_static(b"{}")));
        assert!(cache.get("/images?page=2").is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        cache.insert("k", Bytes::from_static(b"1"), Some(Duration::ZERO));

        assert!(cache.get("k").is_none());
        assert_eq!(cache.len(), 1);
        cache.cleanup_expired();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear_drops_everything() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        cache.insert("a", Bytes::from_static(b"1"), None);
        cache.insert("b", Bytes::from_static(b"2"), None);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_sweeper_removes_expired_entries() {
        let cache = Arc::new(ResponseCache::new(Duration::from_millis(10)));
        cache.insert("k", Bytes::from_static(b"1"), None);

        let handle = cache.spawn_sweeper(Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(cache.is_empty());

        drop(cache);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper should stop once the cache is dropped")
            .unwrap();
    }

    fn counting_app(cache: Arc<ResponseCache>, calls: Arc<AtomicUsize>) -> Router {
        let read_calls = calls.clone();
        Router::new()
            .route(
                "/items",
                get(move || {
                    let calls = read_calls.clone();
                    async move {
                        let n = calls.fetch_add(1, Ordering::SeqCst);
                        Json(serde_json::json!({ "n": n }))
                    }
                })
                .layer(middleware::from_fn_with_state(
                    CachePolicy::new(cache.clone()),
                    cache_response,
                )),
            )
            .route(
                "/items",
                axum::routing::post(|| async { StatusCode::NO_CONTENT }).layer(
                    middleware::from_fn_with_state(cache.clone(), invalidate_cache),
                ),
            )
            .route(
                "/failing",
                get(|| async { ApiError::internal("nope") }).layer(
                    middleware::from_fn_with_state(CachePolicy::new(cache), cache_response),
                ),
            )
    }

    async fn get_body(app: &Router, uri: &str) -> (StatusCode, Bytes) {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body)
    }

    #[tokio::test]
    async fn test_middleware_serves_repeated_reads_from_cache() {
        let cache = Arc::new(ResponseCache::new(Duration::from_secs(60)));
        let calls = Arc::new(AtomicUsize::new(0));
        let app = counting_app(cache.clone(), calls.clone());

        let (_, first) = get_body(&app, "/items").await;
        let (_, second) = get_body(&app, "/items").await;
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Different query string, different key
        get_body(&app, "/items?page=2").await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_route_ttl_overrides_default() {
        let cache = Arc::new(ResponseCache::new(Duration::from_secs(60)));
        let calls = Arc::new(AtomicUsize::new(0));
        let route_calls = calls.clone();
        let app = Router::new().route(
            "/short",
            get(move || {
                let calls = route_calls.clone();
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    Json(serde_json::json!({ "n": n }))
                }
            })
            .layer(middleware::from_fn_with_state(
                CachePolicy::with_ttl(cache.clone(), Duration::ZERO),
                cache_response,
            )),
        );

        get_body(&app, "/short").await;
        let (_, body) = get_body(&app, "/short").await;

        assert_eq!(body, Bytes::from_static(br#"{"n":1}"#));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_write_clears_cache() {
        let cache = Arc::new(ResponseCache::new(Duration::from_secs(60)));
        let calls = Arc::new(AtomicUsize::new(0));
        let app = counting_app(cache.clone(), calls.clone());

        get_body(&app, "/items").await;
        assert_eq!(cache.len(), 1);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/items")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(cache.is_empty());

        let (_, body) = get_body(&app, "/items").await;
        assert_eq!(body, Bytes::from_static(br#"{"n":1}"#));
    }

    #[tokio::test]
    async fn test_error_responses_are_not_cached() {
        let cache = Arc::new(ResponseCache::new(Duration::from_secs(60)));
        let app = counting_app(cache.clone(), Arc::new(AtomicUsize::new(0)));

        let (status, _) = get_body(&app, "/failing").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(cache.is_empty());
    }
}
