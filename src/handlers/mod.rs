//! HTTP request handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod crud;
pub mod hero;
pub mod sitemap;
pub mod upload;

/// GET / - service descriptor.
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "name": "imovia-api",
        "version": env!("CARGO_PKG_VERSION"),
        "storage": state.storage.kind(),
    }))
}

/// GET /health - liveness plus a storage ping.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.storage.health().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({"status": "healthy", "storage": state.storage.kind()})),
        ),
        Err(e) => {
            tracing::error!("health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"status": "unhealthy", "storage": state.storage.kind()})),
            )
        }
    }
}
