//! Login, logout and account management.

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{self, SESSION_COOKIE};
use crate::config::Environment;
use crate::entities::{ApiEntity, User};
use crate::error::ApiError;
use crate::middleware::CurrentSession;
use crate::session::SessionRecord;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

fn session_cookie(state: &AppState, value: &str, max_age_secs: i64) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, value, max_age_secs
    );
    if state.config.environment == Environment::Production {
        cookie.push_str("; Secure");
    }
    cookie
}

/// POST /api/login
///
/// Unknown email and wrong password produce the same 401 and no cookie.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let invalid = || ApiError::unauthorized("Invalid email or password");

    let user = state
        .storage
        .find_user_by_email(&body.email)
        .await?
        .ok_or_else(invalid)?;
    if !auth::verify_password(&body.password, &user.password_hash) {
        return Err(invalid());
    }

    let session_id = Uuid::new_v4().to_string();
    let ttl = Duration::hours(state.config.session.ttl_hours);
    let record = SessionRecord::new(json!({"user": user.public()}), Utc::now() + ttl);
    state.sessions.set(&session_id, record).await?;

    let signed = auth::sign_session_id(&session_id, &state.config.session.secret);
    let cookie = session_cookie(&state, &signed, ttl.num_seconds());

    tracing::info!("user {} logged in", user.email);
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(serde_json::to_value(user.public()).map_err(|_| {
            ApiError::internal_server_error("An error occurred while processing your request")
        })?),
    )
        .into_response())
}

/// POST /api/logout - destroy the session and clear the cookie.
pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> Result<Response, ApiError> {
    state.sessions.destroy(&session.session_id).await?;
    let cookie = session_cookie(&state, "", 0);
    Ok(([(header::SET_COOKIE, cookie)], Json(json!({"message": "Logged out"}))).into_response())
}

/// GET /api/user - the logged-in account, sanitized.
pub async fn current_user(
    Extension(session): Extension<CurrentSession>,
) -> Json<crate::entities::PublicUser> {
    Json(session.user)
}

/// POST /api/change-password
pub async fn change_password(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut user: User = state
        .storage
        .get(session.user.id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if !auth::verify_password(&body.current_password, &user.password_hash) {
        return Err(ApiError::unauthorized("Current password is incorrect"));
    }
    auth::validate_password_policy(&body.new_password)?;

    user.password_hash = auth::hash_password(&body.new_password)?;
    user.touch();
    if !state.storage.replace(&user).await? {
        return Err(ApiError::not_found("Record not found"));
    }

    tracing::info!("user {} changed password", user.email);
    Ok(Json(json!({"message": "Password updated"})))
}
