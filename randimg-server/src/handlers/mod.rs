//! HTTP request handlers
//!
//! This module contains all the request handlers for the API endpoints.

pub mod health;
pub mod images;

pub use crate::state::AppState;
pub use health::{health, ready, HealthResponse, ReadyResponse};
pub use images::{
    create_image_handler, get_image_handler, list_images_handler, ImageListResponse,
    ImageResponse,
};

use axum::Json;

use crate::error::ErrorBody;

/// Fallback for unmatched routes
pub async fn not_found_handler() -> (axum::http::StatusCode, Json<ErrorBody>) {
    (
        axum::http::StatusCode::NOT_FOUND,
        Json(ErrorBody {
            code: "NotFound".to_string(),
            message: "Page not found".to_string(),
            validation_errors: None,
        }),
    )
}
