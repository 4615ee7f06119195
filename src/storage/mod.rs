//! Pluggable entity storage.
//!
//! One contract, three backends selected once at startup: ephemeral in-memory
//! arrays, a local single-file SQLite store for development, and a remote
//! managed Postgres store for production. Records are stored as JSON
//! documents (`id`, `data`, `created_at`, `updated_at`) so all entities share
//! the same table shape and the same filter machinery.

use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

pub mod filter;
pub mod memory;
pub mod postgres;
pub mod sqlite;

pub use filter::{Dialect, Filter, SqlResult};
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use sqlite::SqliteStore;

use crate::config::{StorageBackend, StorageConfig};
use crate::entities::{
    AboutSection, ApiEntity, City, Condominium, Contact, Employee, HeroSettings, Project,
    Property, PropertyCategory, User,
};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("connection error: {0}")]
    ConnectionError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error("invalid field name: {0}")]
    InvalidField(String),
}

/// Every entity table, in the order the migration endpoint copies them.
pub const ALL_TABLES: &[&str] = &[
    Property::TABLE,
    Project::TABLE,
    Condominium::TABLE,
    Contact::TABLE,
    PropertyCategory::TABLE,
    City::TABLE,
    HeroSettings::TABLE,
    AboutSection::TABLE,
    Employee::TABLE,
    User::TABLE,
];

/// Storage backend selected at process start and injected everywhere.
pub enum Storage {
    Memory(MemoryStore),
    Sqlite(SqliteStore),
    Postgres(PostgresStore),
}

impl Storage {
    pub async fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        let storage = match config.backend {
            StorageBackend::Memory => Storage::Memory(MemoryStore::new()),
            StorageBackend::Sqlite => {
                Storage::Sqlite(SqliteStore::connect(&config.sqlite_path).await?)
            }
            StorageBackend::Postgres => {
                let url = config.database_url.as_deref().ok_or_else(|| {
                    StorageError::ConnectionError(
                        "DATABASE_URL is required for the postgres backend".to_string(),
                    )
                })?;
                Storage::Postgres(PostgresStore::connect(url).await?)
            }
        };
        storage.ensure_schema().await?;
        Ok(storage)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Storage::Memory(_) => "memory",
            Storage::Sqlite(_) => "sqlite",
            Storage::Postgres(_) => "postgres",
        }
    }

    pub async fn ensure_schema(&self) -> Result<(), StorageError> {
        match self {
            Storage::Memory(_) => Ok(()),
            Storage::Sqlite(s) => s.ensure_schema().await,
            Storage::Postgres(s) => s.ensure_schema().await,
        }
    }

    /// Ping the backend; the /health and database-status endpoints use this.
    pub async fn health(&self) -> Result<(), StorageError> {
        match self {
            Storage::Memory(_) => Ok(()),
            Storage::Sqlite(s) => s.health().await,
            Storage::Postgres(s) => s.health().await,
        }
    }

    pub async fn list<E: ApiEntity>(&self, filter: &Filter) -> Result<Vec<E>, StorageError> {
        let docs = match self {
            Storage::Memory(s) => s.list(E::TABLE, filter).await?,
            Storage::Sqlite(s) => s.list(E::TABLE, filter).await?,
            Storage::Postgres(s) => s.list(E::TABLE, filter).await?,
        };
        docs.into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(Into::into))
            .collect()
    }

    pub async fn get<E: ApiEntity>(&self, id: Uuid) -> Result<Option<E>, StorageError> {
        let id = id.to_string();
        let doc = match self {
            Storage::Memory(s) => s.get(E::TABLE, &id).await?,
            Storage::Sqlite(s) => s.get(E::TABLE, &id).await?,
            Storage::Postgres(s) => s.get(E::TABLE, &id).await?,
        };
        doc.map(serde_json::from_value)
            .transpose()
            .map_err(Into::into)
    }

    pub async fn insert<E: ApiEntity>(&self, entity: &E) -> Result<(), StorageError> {
        let doc = serde_json::to_value(entity)?;
        match self {
            Storage::Memory(s) => s.insert(E::TABLE, doc).await,
            Storage::Sqlite(s) => s.insert(E::TABLE, &doc).await,
            Storage::Postgres(s) => s.insert(E::TABLE, &doc).await,
        }
    }

    /// Persist an updated record. Returns false when the id has no row.
    pub async fn replace<E: ApiEntity>(&self, entity: &E) -> Result<bool, StorageError> {
        let doc = serde_json::to_value(entity)?;
        match self {
            Storage::Memory(s) => s.replace(E::TABLE, doc).await,
            Storage::Sqlite(s) => s.replace(E::TABLE, &doc).await,
            Storage::Postgres(s) => s.replace(E::TABLE, &doc).await,
        }
    }

    /// Returns whether a matching row existed.
    pub async fn delete<E: ApiEntity>(&self, id: Uuid) -> Result<bool, StorageError> {
        let id = id.to_string();
        match self {
            Storage::Memory(s) => s.delete(E::TABLE, &id).await,
            Storage::Sqlite(s) => s.delete(E::TABLE, &id).await,
            Storage::Postgres(s) => s.delete(E::TABLE, &id).await,
        }
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        let filter = Filter::new().eq("email", Value::String(email.to_string())).limit(1);
        Ok(self.list::<User>(&filter).await?.into_iter().next())
    }

    /// Raw document export, used by the one-time migration endpoint.
    pub async fn dump(&self, table: &str) -> Result<Vec<Value>, StorageError> {
        match self {
            Storage::Memory(s) => s.dump(table).await,
            Storage::Sqlite(s) => s.dump(table).await,
            Storage::Postgres(s) => s.dump(table).await,
        }
    }

    /// Raw document import (upsert by id).
    pub async fn restore(&self, table: &str, docs: Vec<Value>) -> Result<usize, StorageError> {
        match self {
            Storage::Memory(s) => s.restore(table, docs).await,
            Storage::Sqlite(s) => s.restore(table, docs).await,
            Storage::Postgres(s) => s.restore(table, docs).await,
        }
    }
}

/// Pull the primary key out of a serialized record.
pub(crate) fn doc_id(doc: &Value) -> Result<String, StorageError> {
    doc.get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| StorageError::InvalidField("id".to_string()))
}

/// Timestamps mirrored into dedicated columns for ordering. Entity records
/// serialize them at fixed width (`entities::time`), so the TEXT columns
/// order lexicographically; the fallback uses the same format.
pub(crate) fn doc_timestamp(doc: &Value, field: &str) -> String {
    doc.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| {
            chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
        })
}
