//! Login session persistence: a key-value store with TTL, pluggable
//! independently of the entity storage backend. Payloads are opaque JSON;
//! expired records are treated as absent and lazily deleted on the read that
//! discovers them. Concurrent writers to one session id last-write-win.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub mod memory;
pub mod sql;

pub use memory::MemorySessionStore;
pub use sql::{PostgresSessionStore, SqliteSessionStore};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub payload: Value,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(payload: Value, expires_at: DateTime<Utc>) -> Self {
        Self { payload, expires_at }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns the record unless missing or expired; expired rows are
    /// deleted on the way out.
    async fn get(&self, session_id: &str) -> Result<Option<SessionRecord>, SessionError>;

    async fn set(&self, session_id: &str, record: SessionRecord) -> Result<(), SessionError>;

    async fn destroy(&self, session_id: &str) -> Result<(), SessionError>;

    /// Extend the expiry of an existing session; missing ids are a no-op.
    async fn touch(
        &self,
        session_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), SessionError>;
}
