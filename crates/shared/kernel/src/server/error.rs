use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

/// Message carried by every 400 produced by field validation.
pub const VALIDATION_ERRORS: &str = "validation errors";

/// JSON error envelope: `{"error": "..."}` or `{"errors": ["..."]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub enum ErrorBody {
    #[serde(rename = "error")]
    Error(String),
    #[serde(rename = "errors")]
    Errors(Vec<String>),
}

/// An HTTP error: status code plus [`ErrorBody`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, body: ErrorBody::Error(message.into()) }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// `400 {"errors": ["validation errors"]}`.
    #[must_use]
    pub fn validation() -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorBody::Errors(vec![VALIDATION_ERRORS.to_owned()]),
        }
    }

    /// Re-shapes `{"error": m}` into `{"errors": [m]}`, keeping the status.
    #[must_use]
    pub fn into_listed(self) -> Self {
        let body = match self.body {
            ErrorBody::Error(message) => ErrorBody::Errors(vec![message]),
            listed @ ErrorBody::Errors(_) => listed,
        };
        Self { status: self.status, body }
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub const fn body(&self) -> &ErrorBody {
        &self.body
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, body = ?self.body, "Request failed");
        }
        (self.status, Json(self.body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}
