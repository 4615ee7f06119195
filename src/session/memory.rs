//! In-process session store for the memory backend and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::session::{SessionError, SessionRecord, SessionStore};

#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, SessionRecord>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, session_id: &str) -> Result<Option<SessionRecord>, SessionError> {
        let now = Utc::now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(session_id) {
                Some(record) if !record.is_expired(now) => return Ok(Some(record.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }
        // Lazy removal of the expired row
        let mut sessions = self.sessions.write().await;
        sessions.remove(session_id);
        Ok(None)
    }

    async fn set(&self, session_id: &str, record: SessionRecord) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session_id.to_string(), record);
        Ok(())
    }

    async fn destroy(&self, session_id: &str) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(session_id);
        Ok(())
    }

    async fn touch(
        &self,
        session_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;
        if let Some(record) = sessions.get_mut(session_id) {
            record.expires_at = expires_at;
        }
        Ok(())
    }
}
