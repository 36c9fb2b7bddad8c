//! Image handlers
//!
//! - POST /image - store a new random image
//! - GET /image/{id} - stream the binary content of a stored image
//! - GET /images - list stored images

use axum::{
    body::Body,
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    response::Response,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{ApiError, ErrorBody, FieldError};
use crate::handlers::AppState;
use crate::store::{ImageRecord, IMAGE_MODEL};
use crate::validation::{validate_image_id, ListImagesParams};

/// Public view of a stored image
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ImageResponse {
    /// Image identifier assigned by the source
    #[schema(example = "fCUEe8jUGywBv3RFNy")]
    pub id: String,
    /// Page URL on the source's site
    #[schema(example = "https://giphy.com/gifs/fCUEe8jUGywBv3RFNy")]
    pub url: String,
    /// Image title
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "happy dance GIF")]
    pub title: Option<String>,
    /// URL of the binary content
    #[schema(example = "https://media.giphy.com/media/fCUEe8jUGywBv3RFNy/giphy.gif")]
    pub image: String,
}

impl From<ImageRecord> for ImageResponse {
    fn from(record: ImageRecord) -> Self {
        Self {
            id: record.id,
            url: record.url,
            title: record.title,
            image: record.image,
        }
    }
}

/// Image listing response
#[derive(Debug, Serialize, ToSchema)]
pub struct ImageListResponse {
    pub images: Vec<ImageResponse>,
}

/// Store a new random image
///
/// Fetches random images from the source until one is found that is not
/// stored yet, or the retry budget runs out.
#[utoipa::path(
    post,
    path = "/image",
    tag = "Images",
    responses(
        (status = 200, description = "Image stored", body = ImageResponse),
        (status = 500, description = "Every candidate was a duplicate, or the source failed", body = ErrorBody)
    )
)]
pub async fn create_image_handler(
    State(state): State<AppState>,
) -> Result<Json<ImageResponse>, ApiError> {
    let record = state.creator.create_random().await?;
    Ok(Json(record.into()))
}

/// Stream the content of a stored image
///
/// The bytes are fetched from the image's origin URL and passed through with
/// the origin's content type.
#[utoipa::path(
    get,
    path = "/image/{id}",
    tag = "Images",
    params(
        ("id" = String, Path, description = "Image identifier")
    ),
    responses(
        (status = 200, description = "Binary image content (typically image/gif)"),
        (status = 404, description = "Image not found", body = ErrorBody),
        (status = 422, description = "Invalid id", body = ErrorBody)
    )
)]
pub async fn get_image_handler(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(id) = id.map_err(|rejection| {
        ApiError::validation(vec![FieldError::new(
            "params",
            "id",
            None,
            rejection.body_text(),
        )])
    })?;
    let id = validate_image_id(&id)?;

    let record = state
        .store
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(IMAGE_MODEL, id))?;

    let upstream = state
        .http_client
        .get(&record.image)
        .send()
        .await?
        .error_for_status()?;

    let mut builder = Response::builder().status(StatusCode::OK);
    for name in [header::CONTENT_TYPE, header::CONTENT_LENGTH] {
        if let Some(value) = upstream.headers().get(&name) {
            builder = builder.header(name, value.clone());
        }
    }

    tracing::debug!(id = %record.id, origin = %record.image, "Streaming image content");

    builder
        .body(Body::from_stream(upstream.bytes_stream()))
        .map_err(|e| ApiError::internal(format!("Failed to build image response: {e}")))
}

/// List stored images
///
/// Returns images sorted by creation date (newest first unless `sort=asc`),
/// optionally restricted to a creation date window.
#[utoipa::path(
    get,
    path = "/images",
    tag = "Images",
    params(ListImagesParams),
    responses(
        (status = 200, description = "Page of stored images", body = ImageListResponse),
        (status = 422, description = "Invalid query parameters", body = ErrorBody)
    )
)]
pub async fn list_images_handler(
    State(state): State<AppState>,
    params: Result<Query<ListImagesParams>, QueryRejection>,
) -> Result<Json<ImageListResponse>, ApiError> {
    let Query(params) = params.map_err(|rejection| {
        ApiError::validation(vec![FieldError::new(
            "query",
            "query",
            None,
            rejection.body_text(),
        )])
    })?;
    let query = params.validate()?;
    let records = state.store.list(&query).await?;

    Ok(Json(ImageListResponse {
        images: records.into_iter().map(ImageResponse::from).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_image_response_from_record() {
        let record = ImageRecord {
            id: "abc".to_string(),
            title: None,
            image: "https://media.example/abc.gif".to_string(),
            url: "https://example/abc".to_string(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(ImageResponse::from(record)).unwrap();
        assert_eq!(json["id"], "abc");
        assert_eq!(json["image"], "https://media.example/abc.gif");
        assert_eq!(json["url"], "https://example/abc");
        assert!(json.get("title").is_none());
        assert!(json.get("created_at").is_none());
    }
}
