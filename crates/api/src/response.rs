//! Standardized API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use telemetry::{ComponentHealthReport, MetricsSnapshot};

/// Response extension carrying a tracked handler's payload.
#[derive(Debug, Clone)]
pub struct TrackedPayload(pub Value);

/// Handler return type for tracked actions.
///
/// Renders `data` as the JSON body and attaches the same value as a
/// [`TrackedPayload`] extension for the tracking middleware.
#[derive(Debug, Clone)]
pub struct Tracked<T> {
    pub status: StatusCode,
    pub data: T,
}

impl<T> Tracked<T> {
    pub fn ok(data: T) -> Self {
        Self {
            status: StatusCode::OK,
            data,
        }
    }

    pub fn created(data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for Tracked<T> {
    fn into_response(self) -> Response {
        let value = match serde_json::to_value(&self.data) {
            Ok(value) => value,
            Err(e) => return ApiError::internal(format!("failed to serialize response: {}", e)).into_response(),
        };

        let mut response = (self.status, Json(&value)).into_response();
        response.extensions_mut().insert(TrackedPayload(value));
        response
    }
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub ready: bool,
    pub components: Vec<ComponentHealthReport>,
    pub metrics: MetricsSnapshot,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }
}

/// API error type for host handlers.
///
/// Never carries a tracked payload, so error responses are not tracked.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ErrorResponse,
}

impl ApiError {
    pub fn with_code(status: StatusCode, code: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            status,
            response: ErrorResponse::new(msg, code),
        }
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::NOT_FOUND, "NOT_FOUND", msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", msg)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.response)).into_response()
    }
}
