//! API error type with IntoResponse
//!
//! Every failure leaves the server as `{"error": <code>, "detail": <message>}`.
//! Server-side faults are logged and answered with a generic detail.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use zit_core::models::ValidationError;
use zit_core::{AuthError, DbError};

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Validation failed (400)
    Validation(ValidationError),

    /// Missing or rejected credential (401)
    Unauthorized(AuthError),

    /// Resource not found (404)
    NotFound { resource: &'static str, id: String },

    /// Uniqueness or reference rule rejected the write (409)
    Conflict(String),

    /// Database error (500, logged)
    Database(DbError),

    /// Internal error (500, logged)
    Internal { message: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Unauthorized(_) => "unauthorized",
            Self::NotFound { .. } => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Database(_) | Self::Internal { .. } => "internal_error",
        }
    }

    fn detail(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::Unauthorized(e) => e.to_string(),
            Self::NotFound { resource, id } => format!("{} '{}' not found", resource, id),
            Self::Conflict(message) => message.clone(),
            Self::Database(e) => {
                // Log the actual error, return generic message
                tracing::error!(error = %e, "database error");
                "an internal error occurred".to_string()
            }
            Self::Internal { message } => {
                tracing::error!(%message, "internal error");
                "an internal error occurred".to_string()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "error": self.code(),
            "detail": self.detail(),
        }));

        if status == StatusCode::UNAUTHORIZED {
            return (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response();
        }
        (status, body).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound { resource, id } => Self::NotFound { resource, id },
            DbError::Conflict(message) => Self::Conflict(message),
            _ => Self::Database(e),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            _ if e.is_credential_failure() => Self::Unauthorized(e),
            AuthError::Db(db) => db.into(),
            _ => Self::Internal {
                message: e.to_string(),
            },
        }
    }
}
