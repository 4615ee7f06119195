//! Route guard for the admin surface.
//!
//! Extracts the session cookie, verifies its signature, loads the session
//! from the store and injects the logged-in user as a request extension. Any
//! failure along the way produces the same 401 so a caller cannot distinguish
//! "no cookie" from "forged cookie" from "expired session".

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;
use chrono::{Duration, Utc};

use crate::auth::{self, SESSION_COOKIE};
use crate::entities::PublicUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Injected into guarded requests; handlers pull it back out with
/// `Extension<CurrentSession>`.
#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub session_id: String,
    pub user: PublicUser,
}

/// Parse the session cookie and verify its signature, returning the raw
/// session id.
pub fn session_id_from_headers(headers: &HeaderMap, secret: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        if name == SESSION_COOKIE {
            auth::verify_cookie_value(value, secret)
        } else {
            None
        }
    })
}

pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let denied = || ApiError::unauthorized("Authentication required");

    let session_id = session_id_from_headers(request.headers(), &state.config.session.secret)
        .ok_or_else(denied)?;
    let record = state.sessions.get(&session_id).await?.ok_or_else(denied)?;

    let user: PublicUser = record
        .payload
        .get("user")
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .ok_or_else(denied)?;

    // Sliding expiry: every authenticated request pushes the TTL forward.
    let expires_at = Utc::now() + Duration::hours(state.config.session.ttl_hours);
    state.sessions.touch(&session_id, expires_at).await?;

    request
        .extensions_mut()
        .insert(CurrentSession { session_id, user });
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extracts_signed_cookie_among_others() {
        let signed = auth::sign_session_id("sid-1", "secret");
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {}={}; lang=pt", SESSION_COOKIE, signed))
                .unwrap(),
        );
        assert_eq!(
            session_id_from_headers(&headers, "secret").as_deref(),
            Some("sid-1")
        );
    }

    #[test]
    fn rejects_tampered_cookie() {
        let signed = auth::sign_session_id("sid-1", "secret");
        let tampered = signed.replace("sid-1", "sid-2");
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("{}={}", SESSION_COOKIE, tampered)).unwrap(),
        );
        assert!(session_id_from_headers(&headers, "secret").is_none());
    }

    #[test]
    fn missing_cookie_yields_none() {
        assert!(session_id_from_headers(&HeaderMap::new(), "secret").is_none());
    }
}
