//! Error handling for the API gateway

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::error::Error;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// API error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error kind (stable identifier, e.g. `InsufficientFunds`)
    pub kind: String,
    /// Human-readable error message
    pub message: String,
    /// Request ID for tracing
    pub request_id: String,
}

/// API errors
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("{0}")]
    Common(#[from] Error),
}

impl ApiError {
    /// Status code and kind reported to the client
    pub fn classify(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "ValidationError"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            ApiError::Common(e) => {
                let status = match e {
                    // Client errors (4xx)
                    Error::InvalidOrder(_)
                    | Error::InsufficientFunds(_)
                    | Error::InsufficientHoldings(_)
                    | Error::ValidationError(_) => StatusCode::BAD_REQUEST,
                    Error::AuthorizationError(_) => StatusCode::UNAUTHORIZED,
                    Error::AccountNotFound(_) => StatusCode::NOT_FOUND,

                    // Collaborator unavailable, safe to retry
                    Error::QuoteUnavailable(_) | Error::PersistenceConflict(_) => StatusCode::SERVICE_UNAVAILABLE,

                    // Server errors (5xx)
                    Error::ConfigurationError(_)
                    | Error::Internal(_)
                    | Error::Database(_)
                    | Error::Migration(_)
                    | Error::Serialization(_)
                    | Error::DecimalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, e.kind())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Generate a request ID for tracking errors
        let request_id = Uuid::new_v4().to_string();
        let (status, kind) = self.classify();

        let message = if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            tracing::error!("API Error [{}]: {:?}", request_id, &self);
            // Internals stay in the log
            "Internal server error".to_string()
        } else {
            tracing::info!("API Error [{}]: {}", request_id, &self);
            self.to_string()
        };

        let body = ErrorResponse {
            kind: kind.to_string(),
            message,
            request_id,
        };

        (status, Json(body)).into_response()
    }
}
