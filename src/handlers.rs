pub mod analytics_handlers;
pub mod auth_handlers;
pub mod category_handlers;
pub mod transaction_handlers;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::validation::format_validation_errors;

/// Error response structure
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
        }
    }
}

/// Build a JSON error response
pub fn error_response(status: StatusCode, error: &str, message: &str) -> Response {
    (status, Json(ErrorResponse::new(error, message))).into_response()
}

/// Log an unexpected failure and hide its details from the client
pub fn internal_error(detail: &str) -> Response {
    tracing::error!(error = %detail, "request failed");
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "An unexpected error occurred",
    )
}

/// Run validator rules on a request body, producing a 400 on failure
pub fn validate_request<T: Validate>(request: &T) -> Result<(), Response> {
    request.validate().map_err(|errors| {
        error_response(
            StatusCode::BAD_REQUEST,
            "validation_error",
            &format_validation_errors(&errors),
        )
    })
}
