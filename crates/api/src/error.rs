use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use talent_core::error::{CoreError, FieldError};
use talent_db::StoreError;

use crate::auth::AuthError;

/// Message returned for every 500, whatever the cause.
const INTERNAL_MESSAGE: &str = "An internal error occurred";

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`], [`AuthError`] and [`StoreError`] and implements
/// [`IntoResponse`] to produce consistent JSON error responses:
/// `{ "error": <message>, "code": <CODE> }`, plus `"fields"` for field
/// validation failures. Internal details are logged, never returned.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `talent_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An authentication flow failure.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A user store failure outside the auth flows.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut fields: Option<&[FieldError]> = None;

        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::InvalidFields(errors) => {
                    fields = Some(errors.as_slice());
                    (
                        StatusCode::BAD_REQUEST,
                        "VALIDATION_ERROR",
                        "Validation failed".to_string(),
                    )
                }
            },

            // --- AuthError variants ---
            AppError::Auth(auth) => match auth {
                AuthError::InvalidInput(msg) => {
                    (StatusCode::BAD_REQUEST, "INVALID_INPUT", msg.clone())
                }
                AuthError::DuplicateEmail => {
                    (StatusCode::CONFLICT, "EMAIL_EXISTS", auth.to_string())
                }
                AuthError::InvalidCredentials => (
                    StatusCode::UNAUTHORIZED,
                    "INVALID_CREDENTIALS",
                    auth.to_string(),
                ),
                AuthError::Unauthenticated => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", auth.to_string())
                }
                AuthError::Internal(msg) => internal("Internal auth error", msg),
            },

            // --- Store errors ---
            AppError::Store(err) => classify_store_error(err),
        };

        let mut body = json!({
            "error": message,
            "code": code,
        });
        if let Some(fields) = fields {
            body["fields"] = json!(fields);
        }

        (status, axum::Json(body)).into_response()
    }
}

fn internal(context: &str, msg: &str) -> (StatusCode, &'static str, String) {
    tracing::error!(error = %msg, "{context}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        INTERNAL_MESSAGE.to_string(),
    )
}

/// Classify a store error into an HTTP status, error code, and message.
///
/// - Duplicate email maps to 409.
/// - `RowNotFound` maps to 404.
/// - Everything else maps to 500 with a sanitized message.
fn classify_store_error(err: &StoreError) -> (StatusCode, &'static str, String) {
    match err {
        StoreError::DuplicateEmail => (StatusCode::CONFLICT, "EMAIL_EXISTS", err.to_string()),
        StoreError::Database(sqlx::Error::RowNotFound) => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        StoreError::Database(db_err) => internal("Database error", &db_err.to_string()),
    }
}
