// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-wide error taxonomy.
///
/// The storage contract never uses errors for the ordinary "no such record"
/// case (that is `Ok(None)` / `Ok(false)`); everything here is either a
/// caller mistake (validation, conflict, bad credentials) or a fatal
/// backend failure that surfaces as an opaque 500.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed")]
    Validation(#[from] validator::ValidationErrors),

    #[error("username already exists")]
    UsernameAlreadyExists,

    #[error("email already exists")]
    EmailAlreadyExists,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("referenced {0} does not exist")]
    BrokenReference(&'static str),

    #[error("referenced {0} belongs to another brewery")]
    CrossTenantReference(&'static str),

    #[error("brewery still has data; delete or move it first")]
    BreweryNotEmpty,

    #[error("endDate must not precede startDate")]
    InvalidDateRange,

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("missing or invalid session")]
    InvalidSession,

    #[error("insufficient role for this operation")]
    Forbidden,

    #[error("user does not belong to a brewery")]
    NoBrewery,

    #[error("database error")]
    Database(#[from] sqlx::Error),

    #[error("bcrypt error: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            // Return every field-level detail so the client can attach
            // messages to the offending inputs.
            AppError::Validation(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "One or more fields are invalid.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }

            AppError::UsernameAlreadyExists
            | AppError::EmailAlreadyExists
            | AppError::BrokenReference(_)
            | AppError::CrossTenantReference(_)
            | AppError::BreweryNotEmpty => (StatusCode::CONFLICT, self.to_string()),

            AppError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),

            AppError::InvalidDateRange => (StatusCode::BAD_REQUEST, self.to_string()),

            AppError::InvalidCredentials | AppError::InvalidSession => {
                (StatusCode::UNAUTHORIZED, self.to_string())
            }

            AppError::Forbidden | AppError::NoBrewery => (StatusCode::FORBIDDEN, self.to_string()),

            // Database / bcrypt / internal failures all collapse into an
            // opaque 500; the detailed message only goes to the log.
            e => {
                tracing::error!("internal server error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred.".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
