use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};
use utoipa::ToSchema;
use validator::ValidationErrors;

use stat_responder_domain::entities::user_data::describe_validation_errors;
use stat_responder_domain::services::{GuidanceError, StoreError};

/// Error response format for API
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error type/code - machine-readable identifier
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    fn new(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
            details: None,
        }
    }

    /// Create a not found error response
    pub fn not_found(resource: &str) -> Self {
        Self::new("not_found", format!("The requested {} could not be found", resource))
    }

    /// Create a validation error response
    pub fn validation_error(message: &str, details: Option<serde_json::Value>) -> Self {
        Self {
            details,
            ..Self::new("validation_error", message)
        }
    }

    /// Create a validation error response from field errors
    pub fn from_validation(errors: &ValidationErrors) -> Self {
        Self::validation_error(
            &describe_validation_errors(errors),
            serde_json::to_value(errors).ok(),
        )
    }

    /// Create a bad request error response
    pub fn bad_request(message: &str) -> Self {
        Self::new("bad_request", message)
    }

    /// The upstream AI or places service failed
    pub fn upstream_error(message: &str) -> Self {
        Self::new("upstream_error", message)
    }

    /// The service cannot answer yet, or lacks a required setting
    pub fn service_unavailable(message: &str) -> Self {
        Self::new("service_unavailable", message)
    }

    /// Create an internal error response
    pub fn internal_error() -> Self {
        Self::new("internal_error", "An unexpected error occurred")
    }

    /// HTTP status for this error code
    pub fn status(&self) -> StatusCode {
        match self.error.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "validation_error" | "bad_request" => StatusCode::BAD_REQUEST,
            "upstream_error" => StatusCode::BAD_GATEWAY,
            "service_unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<StoreError> for ErrorResponse {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(message) => {
                warn!("Invalid user data: {}", message);
                Self::validation_error(&message, None)
            }
            StoreError::NotLoaded => Self::service_unavailable(&err.to_string()),
            StoreError::Persistence { message, rollback } => {
                error!("Failed to persist change {}: {}", rollback.id(), message);
                Self {
                    details: Some(serde_json::json!({ "changeId": rollback.id() })),
                    ..Self::new("persistence_error", "The change could not be saved")
                }
            }
            StoreError::Backend(message) => {
                error!("User data backend error: {}", message);
                Self::internal_error()
            }
        }
    }
}

impl From<GuidanceError> for ErrorResponse {
    fn from(err: GuidanceError) -> Self {
        match err {
            GuidanceError::Validation(message) => {
                warn!("Rejected guidance request: {}", message);
                Self::validation_error(&message, None)
            }
            GuidanceError::Configuration(message) => {
                warn!("Guidance request needs configuration: {}", message);
                Self::service_unavailable(&message)
            }
            GuidanceError::Upstream(_) | GuidanceError::Http(_) | GuidanceError::MalformedResponse(_) => {
                error!("Upstream guidance failure: {}", err);
                Self::upstream_error(&err.to_string())
            }
        }
    }
}
