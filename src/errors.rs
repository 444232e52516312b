use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::error::DbErr;
use serde::Serialize;
use serde_json::json;

use crate::lifecycle::requirements::OrderField;
use crate::lifecycle::status::OrderStatus;

/// Error type shared by the lifecycle engine, services and handlers.
///
/// Everything crosses the engine boundary as a typed result so callers can
/// render a specific message per kind; nothing is thrown across it.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Target not reachable from the current status in one hop. Surfaced
    /// verbatim with both state labels; never retried.
    #[error("cannot transition order from '{from}' to '{to}'")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Mandatory fields absent before a gated transition. Callers render a
    /// form for exactly these fields, not a generic failure.
    #[error("missing required fields: {}", format_fields(.0))]
    MissingRequiredFields(Vec<OrderField>),

    /// An inventory/cancel procedure failed; the order status is guaranteed
    /// unchanged. The message stays generic at the HTTP boundary.
    #[error("processing failed: {0}")]
    ProcedureFailure(String),

    /// Record absent or not owned by the caller. The two cases are not
    /// distinguished to avoid leaking existence.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("authentication error: {0}")]
    AuthError(String),

    #[error("internal error: {0}")]
    InternalError(String),
}

impl ServiceError {
    pub fn db_error(e: DbErr) -> Self {
        ServiceError::DatabaseError(e)
    }
}

fn format_fields(fields: &[OrderField]) -> String {
    fields
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    missing_fields: Option<Vec<OrderField>>,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, error, message, missing_fields) = match self {
            ServiceError::InvalidTransition { .. } => (
                StatusCode::BAD_REQUEST,
                "Invalid Transition",
                self.to_string(),
                None,
            ),
            ServiceError::MissingRequiredFields(ref fields) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Missing Required Fields",
                self.to_string(),
                Some(fields.clone()),
            ),
            ServiceError::ProcedureFailure(ref detail) => {
                tracing::error!(detail = %detail, "transition procedure failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Processing Failed",
                    // Generic user-facing message; detail stays in the logs.
                    "processing failed, the order was not modified".to_string(),
                    None,
                )
            }
            ServiceError::NotFound(_) => {
                (StatusCode::NOT_FOUND, "Not Found", self.to_string(), None)
            }
            ServiceError::ValidationError(_) => (
                StatusCode::BAD_REQUEST,
                "Validation Error",
                self.to_string(),
                None,
            ),
            ServiceError::InvalidOperation(_) => (
                StatusCode::CONFLICT,
                "Invalid Operation",
                self.to_string(),
                None,
            ),
            ServiceError::AuthError(_) => (
                StatusCode::UNAUTHORIZED,
                "Unauthorized",
                self.to_string(),
                None,
            ),
            ServiceError::DatabaseError(ref e) => {
                tracing::error!(error = %e, "database error reached the http boundary");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error",
                    "internal server error".to_string(),
                    None,
                )
            }
            ServiceError::InternalError(ref e) => {
                tracing::error!(error = %e, "internal error reached the http boundary");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error",
                    "internal server error".to_string(),
                    None,
                )
            }
        };

        let body = ErrorBody {
            error,
            message,
            missing_fields,
        };
        (status, Json(json!({ "success": false, "error": body }))).into_response()
    }
}
