//! OpenAPI documentation configuration
//!
//! Generates the OpenAPI 3.0 document served by Swagger UI outside production.

use utoipa::OpenApi;

use crate::error::{ErrorBody, FieldError};
use crate::handlers::{HealthResponse, ImageListResponse, ImageResponse, ReadyResponse};

/// Random image API - OpenAPI Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Random Image API",
        version = "0.1.0",
        description = r#"
## Random image collection backed by Giphy

- `POST /image` stores a random image, retrying when the source returns an id that is already stored
- `GET /images` lists stored images, newest first, with paging and a creation date window
- `GET /image/{id}` streams the binary content of a stored image from its origin

Listings are cached for a short time; every successful or failed write clears the cache.
"#
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    tags(
        (name = "Images", description = "Store, list and stream random images"),
        (name = "Health", description = "Service health and readiness endpoints")
    ),
    paths(
        crate::handlers::health::health,
        crate::handlers::health::ready,
        crate::handlers::images::create_image_handler,
        crate::handlers::images::get_image_handler,
        crate::handlers::images::list_images_handler,
    ),
    components(
        schemas(
            HealthResponse,
            ReadyResponse,
            ImageResponse,
            ImageListResponse,
            ErrorBody,
            FieldError,
        )
    )
)]
pub struct ApiDoc;
