//! Router configuration module
//!
//! Configures all routes, middleware layers, and creates the application router.

use std::{sync::Arc, time::Duration};

use axum::{
    http::{header, Method, StatusCode},
    middleware,
    routing::{get, post},
    Router,
};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::cache::{cache_response, invalidate_cache, CachePolicy};
use crate::config::Config;
use crate::error::redact_internal_errors;
use crate::handlers::{
    create_image_handler, get_image_handler, health, list_images_handler, not_found_handler,
    ready, AppState,
};
use crate::openapi::ApiDoc;

/// Create the application router with default config (for testing)
pub fn create_router(state: AppState) -> Router {
    create_router_with_config(state, &Config::default())
}

/// Create the application router with custom configuration
pub fn create_router_with_config(state: AppState, config: &Config) -> Router {
    // Configure CORS based on allowed_origins
    let cors = match &config.allowed_origins {
        Some(origins) if !origins.is_empty() => {
            let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            tracing::info!("CORS: Restricting to {} origin(s)", origins.len());
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        }
        _ => {
            tracing::warn!("CORS: Allowing all origins (dev mode)");
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    };

    let body_limit = RequestBodyLimitLayer::new(config.body_limit_mb * 1024 * 1024);

    let timeout = TimeoutLayer::with_status_code(
        StatusCode::REQUEST_TIMEOUT,
        Duration::from_secs(config.timeout_secs),
    );

    // Writes clear the listing cache; listings are served from it
    let invalidate = middleware::from_fn_with_state(state.cache.clone(), invalidate_cache);
    let listing_policy = match config.images_cache_ttl() {
        Some(ttl) => CachePolicy::with_ttl(state.cache.clone(), ttl),
        None => CachePolicy::new(state.cache.clone()),
    };
    let cached = middleware::from_fn_with_state(listing_policy, cache_response);

    let mut router = Router::new()
        .route("/image", post(create_image_handler).layer(invalidate))
        .route("/image/{id}", get(get_image_handler))
        .route("/images", get(list_images_handler).layer(cached))
        .route("/health", get(health))
        .route("/ready", get(ready))
        .method_not_allowed_fallback(not_found_handler)
        .fallback(not_found_handler)
        .with_state(state);

    if !config.expose_internal_errors() {
        router = router.layer(middleware::from_fn(redact_internal_errors));
    }

    if !config.production {
        router = router
            .merge(SwaggerUi::new("/api-doc").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }

    let router = router.layer(cors).layer(body_limit).layer(timeout);

    // Conditionally apply rate limiting (disabled in tests, enabled in production)
    if config.rate_limit_enabled {
        let governor_conf = GovernorConfigBuilder::default()
            .per_second(config.rate_limit_per_sec)
            .burst_size(config.rate_limit_burst)
            .finish()
            .expect("Failed to build rate limiter config");

        tracing::info!(
            "Rate limiting: {} req/s (burst: {})",
            config.rate_limit_per_sec,
            config.rate_limit_burst
        );

        router
            .layer(GovernorLayer::new(Arc::new(governor_conf)))
            .layer(TraceLayer::new_for_http())
    } else {
        tracing::warn!("Rate limiting: DISABLED");
        router.layer(TraceLayer::new_for_http())
    }
}
