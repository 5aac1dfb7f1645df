use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use cape_database::Database;
use cape_kernel::domain::config::ApiConfig;
use cape_kernel::server::{ApiState, system_router};
use http_body_util::BodyExt;
use std::time::Duration;
use tower::ServiceExt;

async fn state() -> ApiState {
    let database =
        Database::builder().url("sqlite::memory:").init().await.expect("in-memory database");
    ApiState::builder().config(ApiConfig::default()).db(database).build().expect("state")
}

fn router(state: ApiState) -> Router {
    let (router, _api) = system_router().split_for_parts();
    router.with_state(state)
}

async fn app() -> Router {
    router(state().await)
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

#[tokio::test]
async fn index_serves_landing_page() {
    let response = app()
        .await
        .oneshot(Request::get("/").body(Body::empty()).expect("request"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "<h1>Code challenge</h1>");
}

#[tokio::test]
async fn health_reports_up_with_version() {
    let response = app()
        .await
        .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("cache-control").and_then(|v| v.to_str().ok()),
        Some("no-store, no-cache, must-revalidate")
    );

    let body: serde_json::Value =
        serde_json::from_str(&body_string(response).await).expect("json body");
    assert_eq!(body["status"], "up");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn registered_slices_are_listed() {
    let database =
        Database::builder().url("sqlite::memory:").init().await.expect("in-memory database");
    let state = ApiState::builder().db(database).build().expect("state");

    assert_eq!(state.slice_names().count(), 0);
    assert_eq!(state.config.server.port, 5555);
}

#[tokio::test]
async fn uptime_counts_from_state_creation() {
    let state = state().await;
    tokio::time::sleep(Duration::from_millis(1100)).await;

    let response = router(state.clone())
        .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
        .await
        .expect("response");

    let body: serde_json::Value =
        serde_json::from_str(&body_string(response).await).expect("json body");
    assert!(body["uptime"].as_u64().is_some_and(|secs| secs >= 1), "uptime: {}", body["uptime"]);
    assert!(state.uptime() >= Duration::from_millis(1100));
}
