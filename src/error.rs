use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;
use std::fmt;

/// Failure reported by a store adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    NotFound,
    Transient(String),
    Permanent(String),
}

impl StoreError {
    pub fn transient<S: Into<String>>(msg: S) -> Self {
        Self::Transient(msg.into())
    }
    pub fn permanent<S: Into<String>>(msg: S) -> Self {
        Self::Permanent(msg.into())
    }
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient(_))
    }
    pub fn message(&self) -> &str {
        match self {
            StoreError::NotFound => "document not found",
            StoreError::Transient(s) | StoreError::Permanent(s) => s.as_str(),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for StoreError {}

/// Sorts an opaque driver error into transient or permanent by its message.
pub fn classify_store_error<E: fmt::Display>(e: &E) -> StoreError {
    let s = e.to_string();
    let lower = s.to_lowercase();
    if lower.contains("connection") || lower.contains("timed out") || lower.contains("timeout") || lower.contains("broken pipe") {
        StoreError::transient(s)
    } else {
        StoreError::permanent(s)
    }
}

/// An HTTP failure rendered as `{"error": "<message>"}`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new<S: Into<String>>(status: StatusCode, msg: S) -> Self {
        Self { status, message: msg.into() }
    }
    pub fn bad_request<S: Into<String>>(msg: S) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
