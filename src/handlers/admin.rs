//! Operational endpoints for the admin panel: backend status and a one-shot
//! copy of every table into a remote database.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;
use crate::storage::{PostgresStore, StorageError, ALL_TABLES};

/// GET /api/database/status
pub async fn database_status(State(state): State<AppState>) -> Json<Value> {
    let healthy = state.storage.health().await.is_ok();
    Json(json!({
        "backend": state.storage.kind(),
        "healthy": healthy,
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MigrateRequest {
    /// Target database; falls back to the configured remote URL.
    pub database_url: Option<String>,
}

/// POST /api/database/migrate
///
/// Copies every table from the active backend into the target database,
/// upserting by id so the call is repeatable.
pub async fn migrate_database(
    State(state): State<AppState>,
    body: Option<Json<MigrateRequest>>,
) -> Result<Json<Value>, ApiError> {
    let url = body
        .and_then(|Json(req)| req.database_url)
        .or_else(|| state.config.storage.database_url.clone())
        .ok_or_else(|| ApiError::bad_request("No target database URL provided"))?;

    let target = match PostgresStore::connect(&url).await {
        Ok(target) => target,
        Err(StorageError::ConnectionError(msg)) => return Err(ApiError::bad_request(msg)),
        Err(other) => return Err(other.into()),
    };
    target.ensure_schema().await?;

    let mut migrated = serde_json::Map::new();
    for table in ALL_TABLES {
        let docs = state.storage.dump(table).await?;
        let count = target.restore(table, docs).await?;
        migrated.insert(table.to_string(), json!(count));
    }

    tracing::info!("migration complete: {:?}", migrated);
    Ok(Json(json!({"migrated": migrated})))
}
