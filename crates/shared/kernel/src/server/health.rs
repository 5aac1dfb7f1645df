use crate::server::state::ApiState;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse};
use axum::Json;
use cape_domain::constants::SYSTEM_TAG;
use serde::Serialize;
use utoipa::ToSchema;

/// Health check response
#[derive(Debug, Serialize, ToSchema)]
pub(super) struct HealthResponse {
    /// `up` when the database answers, `degraded` otherwise
    status: &'static str,
    /// Version
    version: &'static str,
    /// Seconds since the server finished bootstrapping
    uptime: u64,
}

#[utoipa::path(
    get,
    path = "/",
    responses((status = OK, description = "Landing page", content_type = "text/html", body = String)),
    tag = SYSTEM_TAG,
)]
pub(super) async fn index_handler() -> Html<&'static str> {
    Html("<h1>Code challenge</h1>")
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = OK, description = "Service and database are up", body = HealthResponse),
        (status = SERVICE_UNAVAILABLE, description = "Database is unreachable", body = HealthResponse),
    ),
    tag = SYSTEM_TAG,
)]
pub(super) async fn health_handler(State(state): State<ApiState>) -> impl IntoResponse {
    let (code, status) = match state.database.health().await {
        Ok(()) => (StatusCode::OK, "up"),
        Err(error) => {
            tracing::warn!(%error, "Health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "degraded")
        },
    };

    let body = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.uptime().as_secs(),
    };

    (
        code,
        [
            (header::CACHE_CONTROL, "no-store, no-cache, must-revalidate"),
            (header::PRAGMA, "no-cache"),
        ],
        Json(body),
    )
}
