//! API error handling module
//!
//! Provides a unified error type for all API endpoints. Every variant maps to
//! an HTTP status and a JSON body of the shape `{code, message}`; validation
//! failures additionally carry `validationErrors`.

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use randimg_core::SourceError;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::store::StoreError;

/// Message returned in place of internal details when they are redacted.
pub const REDACTED_MESSAGE: &str = "InternalError";

/// A single failed check on request input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    /// Offending value as received, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Human readable reason
    pub msg: String,
    /// Parameter name
    pub param: String,
    /// Where the parameter was read from: "query" or "params"
    pub location: String,
}

impl FieldError {
    pub fn new(
        location: &str,
        param: &str,
        value: Option<&str>,
        msg: impl Into<String>,
    ) -> Self {
        Self {
            value: value.map(str::to_string),
            msg: msg.into(),
            param: param.to_string(),
            location: location.to_string(),
        }
    }
}

/// Body of every error response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Error kind, e.g. "ValidationError", "NotFoundError", "ApiError"
    pub code: String,
    /// Human readable message
    pub message: String,
    /// Per-field details, validation failures only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_errors: Option<Vec<FieldError>>,
}

/// Marker attached to responses whose message may be hidden from clients.
#[derive(Debug, Clone, Copy)]
pub struct Redactable;

/// API error type with structured variants for different error categories
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or missing request input
    #[error("Wrong schema")]
    Validation(Vec<FieldError>),

    /// Referenced entity does not exist
    #[error("{entity} with id {id} was not found")]
    NotFound { entity: &'static str, id: String },

    /// General application-level failure with an explicit status
    #[error("{message}")]
    Api { message: String, status: StatusCode },

    /// Persistence failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Random image source failure
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Failure while streaming image content from its origin
    #[error("Upstream image request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    /// Unexpected server-side failure
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Create a validation error
    pub fn validation(errors: Vec<FieldError>) -> Self {
        Self::Validation(errors)
    }

    /// Create a not found error
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Create an application error with status 500
    pub fn api(message: impl Into<String>) -> Self {
        Self::api_with_status(message, StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Create an application error with an explicit status
    pub fn api_with_status(message: impl Into<String>, status: StatusCode) -> Self {
        Self::Api {
            message: message.into(),
            status,
        }
    }

    /// Create an internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Api { status, .. } => *status,
            Self::Store(_) | Self::Source(_) | Self::Upstream(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get the error code for programmatic error handling
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "ValidationError",
            Self::NotFound { .. } => "NotFoundError",
            Self::Api { .. } => "ApiError",
            Self::Store(_) | Self::Source(_) | Self::Upstream(_) | Self::Internal(_) => {
                "InternalError"
            }
        }
    }

    /// Whether the message carries internal details
    fn is_internal(&self) -> bool {
        self.error_code() == "InternalError"
    }

    /// Get the error category for logging
    fn error_category(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound { .. } => "not_found",
            Self::Api { .. } => "api",
            Self::Store(StoreError::UniqueConstraint { .. }) => "unique_constraint",
            Self::Store(_) => "database",
            Self::Source(_) => "image_source",
            Self::Upstream(_) => "upstream",
            Self::Internal(_) => "internal",
        }
    }

    /// Build the response body
    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            code: self.error_code().to_string(),
            message: self.to_string(),
            validation_errors: match self {
                Self::Validation(errors) => Some(errors.clone()),
                _ => None,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let category = self.error_category();
        let code = self.error_code();
        let internal_message = self.to_string();

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                category = category,
                code = code,
                error = %internal_message,
                "Server error"
            );
        } else {
            tracing::warn!(
                status = %status,
                category = category,
                code = code,
                error = %internal_message,
                "Client error"
            );
        }

        let mut response = (status, Json(self.body())).into_response();
        if self.is_internal() {
            response.extensions_mut().insert(Redactable);
        }
        response
    }
}

/// JSON body for an internal error with its message hidden
pub fn redacted_response(status: StatusCode) -> Response {
    let body = ErrorBody {
        code: "InternalError".to_string(),
        message: REDACTED_MESSAGE.to_string(),
        validation_errors: None,
    };
    (status, Json(body)).into_response()
}

/// Middleware hiding internal error messages from clients
///
/// Installed in production deployments only. Responses produced by
/// [`ApiError`] variants that carry internal details are replaced by a
/// generic body with the same status.
pub async fn redact_internal_errors(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    if response.extensions().get::<Redactable>().is_some() {
        return redacted_response(response.status());
    }
    response
}
