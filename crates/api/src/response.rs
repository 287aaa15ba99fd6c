//! Response envelope shared by all endpoints.
//!
//! Successful handlers return `{"data": ...}`; error bodies are
//! produced by [`plaza_common::AppError`]'s own `IntoResponse` impl as
//! `{"error": {"code", "message"}}`, so the envelope here only carries
//! the success arm.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Envelope for endpoint payloads.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Wrap a payload in the success envelope.
    pub const fn ok(data: T) -> Self {
        Self { data }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Bodyless success, used by deletes and rejects.
#[must_use]
pub fn ok() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}
