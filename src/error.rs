use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::models::status::OrderStatus;

#[derive(Debug, Error, PartialEq)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid role: {0}")]
    InvalidRole(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// `scope` names what was being transitioned, e.g. `order` or `item <id>`.
    #[error("invalid transition for {scope}: {from} -> {to}: {reason}")]
    InvalidTransition {
        scope: String,
        from: OrderStatus,
        to: OrderStatus,
        reason: &'static str,
    },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::InvalidRole(_) => "INVALID_ROLE",
            AppError::InvalidArgument(_) => "INVALID_ARGUMENT",
            AppError::InvalidTransition { .. } => "INVALID_TRANSITION",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Unavailable(_) => "UNAVAILABLE",
            AppError::Internal(_) => "INTERNAL",
        }
    }

    /// Whether the failure was caused by the caller's input rather than the service.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, AppError::Unavailable(_) | AppError::Internal(_))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidRole(_) | AppError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidTransition { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.kind(),
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}
