//! Hero settings have bespoke read endpoints: the public site wants the
//! active record, the admin panel wants the newest one regardless of the
//! active flag. Writes go through the generic CRUD handlers.

use axum::extract::State;
use axum::Json;
use serde_json::json;

use crate::entities::{HeroSettings, OrderDir};
use crate::error::ApiError;
use crate::state::AppState;
use crate::storage::Filter;

/// GET /api/hero-settings - most recently updated active record.
pub async fn active(State(state): State<AppState>) -> Result<Json<HeroSettings>, ApiError> {
    let filter = Filter::new()
        .eq("active", json!(true))
        .order_by("updated_at", OrderDir::Desc)
        .limit(1);
    state
        .storage
        .list::<HeroSettings>(&filter)
        .await?
        .into_iter()
        .next()
        .map(Json)
        .ok_or_else(|| ApiError::not_found("No active hero settings"))
}

/// GET /api/hero-settings/latest - newest record, active or not.
pub async fn latest(State(state): State<AppState>) -> Result<Json<HeroSettings>, ApiError> {
    let filter = Filter::new()
        .order_by("created_at", OrderDir::Desc)
        .limit(1);
    state
        .storage
        .list::<HeroSettings>(&filter)
        .await?
        .into_iter()
        .next()
        .map(Json)
        .ok_or_else(|| ApiError::not_found("No hero settings"))
}
