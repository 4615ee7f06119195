#![allow(dead_code)]

//! In-process test harness: the full router over the memory backend, driven
//! with `tower::ServiceExt::oneshot` so no port or external database is
//! needed.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use imovia::auth;
use imovia::config::AppConfig;
use imovia::entities::User;
use imovia::session::MemorySessionStore;
use imovia::state::AppState;
use imovia::storage::Storage;

pub const ADMIN_EMAIL: &str = "admin@imovia.com";
pub const ADMIN_PASSWORD: &str = "Adm1n!pass";

pub async fn test_app() -> Router {
    test_app_with_config(AppConfig::test()).await
}

pub async fn test_app_with_config(config: AppConfig) -> Router {
    let storage = Storage::from_config(&config.storage)
        .await
        .expect("memory storage never fails to initialize");

    let hash = auth::hash_password(ADMIN_PASSWORD).expect("hashing");
    let admin = User::new(ADMIN_EMAIL, "Admin", hash);
    storage.insert(&admin).await.expect("seed admin");

    let state = AppState::new(config, storage, Arc::new(MemorySessionStore::new()));
    imovia::router(state)
}

/// Fire one request and return status, parsed JSON body (Null when empty or
/// not JSON) and response headers.
pub async fn request(
    app: &Router,
    method: Method,
    path: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value, HeaderMap) {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };

    let response = app.clone().oneshot(request).await.expect("infallible");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value, headers)
}

pub async fn get(app: &Router, path: &str, cookie: Option<&str>) -> (StatusCode, Value, HeaderMap) {
    request(app, Method::GET, path, cookie, None).await
}

pub async fn post(
    app: &Router,
    path: &str,
    cookie: Option<&str>,
    body: Value,
) -> (StatusCode, Value, HeaderMap) {
    request(app, Method::POST, path, cookie, Some(body)).await
}

pub async fn put(
    app: &Router,
    path: &str,
    cookie: Option<&str>,
    body: Value,
) -> (StatusCode, Value, HeaderMap) {
    request(app, Method::PUT, path, cookie, Some(body)).await
}

pub async fn delete(
    app: &Router,
    path: &str,
    cookie: Option<&str>,
) -> (StatusCode, Value, HeaderMap) {
    request(app, Method::DELETE, path, cookie, None).await
}

/// Log in as the seeded admin and return the `name=value` cookie pair to
/// send on subsequent requests.
pub async fn login(app: &Router) -> String {
    let (status, _, headers) = post(
        app,
        "/api/login",
        None,
        json!({"email": ADMIN_EMAIL, "password": ADMIN_PASSWORD}),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "admin login failed");
    session_cookie(&headers).expect("login sets the session cookie")
}

/// Extract the session cookie pair from a Set-Cookie header, if present.
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::SET_COOKIE)?.to_str().ok()?;
    Some(raw.split(';').next()?.trim().to_string())
}
