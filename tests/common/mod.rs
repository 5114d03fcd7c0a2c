#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use novacore_backend::{config::Settings, create_router, services::CheckRegistry, AppState};
use serde_json::Value;
use tower::ServiceExt;

/// Application state over fresh in-memory stores, independent of the environment
pub fn create_test_state() -> AppState {
    AppState::new(Settings::default())
}

pub fn create_test_state_with(settings: Settings, registry: CheckRegistry) -> AppState {
    AppState::with_registry(settings, registry)
}

pub fn create_test_app(app_state: AppState) -> Router {
    create_router(app_state)
}

/// Collect a response body as JSON
pub async fn extract_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, extract_body(response).await)
}

pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(
        app,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

pub async fn delete(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(
        app,
        Request::builder()
            .method("DELETE")
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
}
