use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::repositories::user::StoreError;

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// The user store failed. `message` is the only part shown to the client.
    #[error("Store error: {source}")]
    Store {
        #[source]
        source: StoreError,
        message: &'static str,
    },

    /// A validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Credentials were rejected.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// No live session is bound to the request.
    #[error("Not authenticated")]
    Unauthenticated,

    /// A unique field is already taken.
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl AppError {
    /// Wraps a store failure with the message the client should see.
    pub fn store(source: StoreError, message: &'static str) -> Self {
        AppError::Store { source, message }
    }

    /// The HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Authentication(_) | AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
        }
    }
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            AppError::Store { ref source, message } => {
                tracing::error!("Store error: {}", source);
                sonic_rs::to_string(&sonic_rs::json!({ "error": message }))
            }

            AppError::Validation(ref msg) => {
                tracing::debug!("Validation error: {}", msg);
                sonic_rs::to_string(&sonic_rs::json!({ "error": msg.as_str() }))
            }

            AppError::Authentication(ref msg) => {
                tracing::warn!("Authentication failed: {}", msg);
                sonic_rs::to_string(&sonic_rs::json!({ "error": msg.as_str() }))
            }

            AppError::Unauthenticated => {
                tracing::debug!("Request without a live session");
                sonic_rs::to_string(&sonic_rs::json!({ "authenticated": false }))
            }

            AppError::Conflict(ref msg) => {
                tracing::debug!("Conflict: {}", msg);
                sonic_rs::to_string(&sonic_rs::json!({ "error": msg.as_str() }))
            }
        }
        .unwrap_or_else(|_| r#"{"error":"Internal server error"}"#.to_string());

        (
            status,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response()
    }
}
