//! Generic CRUD handlers, instantiated per entity by the router.
//!
//! All entities share the same request/response conventions: list endpoints
//! accept whitelisted equality filters as query parameters, creates return
//! 201 with the stored record, updates are partial, deletes return 204.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::entities::ApiEntity;
use crate::error::ApiError;
use crate::state::AppState;
use crate::storage::Filter;

/// Query-string values arrive as strings; `true`/`false` compare against
/// JSON booleans, everything else compares as a string.
fn parse_query_value(raw: &str) -> Value {
    match raw {
        "true" => json!(true),
        "false" => json!(false),
        _ => json!(raw),
    }
}

/// 409 if another record already holds one of the entity's unique fields.
async fn check_unique<E: ApiEntity>(
    state: &AppState,
    entity: &E,
    exclude: Option<Uuid>,
) -> Result<(), ApiError> {
    let fields = E::unique_fields();
    if fields.is_empty() {
        return Ok(());
    }

    let doc = serde_json::to_value(entity)
        .map_err(|_| ApiError::internal_server_error("An error occurred while processing your request"))?;
    for field in fields {
        let Some(value) = doc.get(*field) else {
            continue;
        };
        let filter = Filter::new().eq(*field, value.clone());
        let existing = state.storage.list::<E>(&filter).await?;
        if existing.iter().any(|other| Some(other.id()) != exclude) {
            return Err(ApiError::conflict(format!(
                "A record with this {} already exists",
                field
            )));
        }
    }
    Ok(())
}

pub async fn list<E: ApiEntity>(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<E>>, ApiError> {
    let (field, dir) = E::order();
    let mut filter = Filter::new().order_by(field, dir);
    for field in E::filterable() {
        if let Some(raw) = params.get(*field) {
            filter = filter.eq(*field, parse_query_value(raw));
        }
    }
    Ok(Json(state.storage.list::<E>(&filter).await?))
}

pub async fn get<E: ApiEntity>(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<E>, ApiError> {
    state
        .storage
        .get::<E>(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Record not found"))
}

pub async fn create<E: ApiEntity>(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<E>), ApiError> {
    let input: E::Input = serde_json::from_value(body)
        .map_err(|e| ApiError::bad_request(format!("Invalid request body: {}", e)))?;
    E::validate(&input)?;

    let entity = E::from_input(input);
    check_unique(&state, &entity, None).await?;
    state.storage.insert(&entity).await?;
    Ok((StatusCode::CREATED, Json(entity)))
}

pub async fn update<E: ApiEntity>(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<Value>,
) -> Result<Json<E>, ApiError> {
    let patch: E::Patch = serde_json::from_value(body)
        .map_err(|e| ApiError::bad_request(format!("Invalid request body: {}", e)))?;
    E::validate_patch(&patch)?;

    let mut entity = state
        .storage
        .get::<E>(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Record not found"))?;
    entity.apply_patch(patch);
    entity.touch();
    check_unique(&state, &entity, Some(id)).await?;

    if !state.storage.replace(&entity).await? {
        // Deleted between the read and the write
        return Err(ApiError::not_found("Record not found"));
    }
    Ok(Json(entity))
}

pub async fn remove<E: ApiEntity>(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.storage.delete::<E>(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Record not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_values_coerce_booleans_only() {
        assert_eq!(parse_query_value("true"), json!(true));
        assert_eq!(parse_query_value("false"), json!(false));
        assert_eq!(parse_query_value("available"), json!("available"));
        assert_eq!(parse_query_value("42"), json!("42"));
    }
}
