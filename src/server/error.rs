//! Error-to-HTTP response conversion.
//!
//! Handlers return `Result<T, AppError>`; anything convertible into
//! [`mama_common::Error`] can be propagated with `?`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mama_common::Error;
use serde_json::json;

/// Wrapper so we can implement `IntoResponse` for an external type.
#[derive(Debug)]
pub struct AppError(pub Error);

impl AppError {
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl<E: Into<Error>> From<E> for AppError {
    fn from(e: E) -> Self {
        Self(e.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self.0, "Request failed");
        } else {
            tracing::debug!(status = %status, error = %self.0, "Request rejected");
        }

        let body = json!({
            "error": self.0.to_string(),
            "code": self.0.code(),
        });

        (status, axum::Json(body)).into_response()
    }
}
