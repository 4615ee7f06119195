//! Session stores backed by a `sessions` table inside whichever SQL backend
//! is active. The serialized payload is an opaque blob keyed by session id;
//! the expiry column is checked on every read and expired rows are deleted
//! there instead of by a background sweep.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{PgPool, Row, SqlitePool};

use crate::session::{SessionError, SessionRecord, SessionStore};

fn parse_expiry(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        // An unreadable expiry counts as already expired
        .unwrap_or_else(|_| DateTime::<Utc>::MIN_UTC)
}

pub struct SqliteSessionStore {
    pool: SqlitePool,
}

impl SqliteSessionStore {
    pub async fn new(pool: SqlitePool) -> Result<Self, SessionError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS sessions (\
             sid TEXT PRIMARY KEY, \
             payload TEXT NOT NULL, \
             expires_at TEXT NOT NULL)",
        )
        .execute(&pool)
        .await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn get(&self, session_id: &str) -> Result<Option<SessionRecord>, SessionError> {
        let row = sqlx::query("SELECT payload, expires_at FROM sessions WHERE sid = ?")
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };

        let expires_at = parse_expiry(&row.try_get::<String, _>("expires_at")?);
        if expires_at <= Utc::now() {
            sqlx::query("DELETE FROM sessions WHERE sid = ?")
                .bind(session_id)
                .execute(&self.pool)
                .await?;
            return Ok(None);
        }

        let payload: Value = serde_json::from_str(&row.try_get::<String, _>("payload")?)?;
        Ok(Some(SessionRecord::new(payload, expires_at)))
    }

    async fn set(&self, session_id: &str, record: SessionRecord) -> Result<(), SessionError> {
        sqlx::query(
            "INSERT INTO sessions (sid, payload, expires_at) VALUES (?, ?, ?) \
             ON CONFLICT(sid) DO UPDATE SET payload = excluded.payload, \
             expires_at = excluded.expires_at",
        )
        .bind(session_id)
        .bind(record.payload.to_string())
        .bind(record.expires_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn destroy(&self, session_id: &str) -> Result<(), SessionError> {
        sqlx::query("DELETE FROM sessions WHERE sid = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn touch(
        &self,
        session_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        sqlx::query("UPDATE sessions SET expires_at = ? WHERE sid = ?")
            .bind(expires_at.to_rfc3339())
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

pub struct PostgresSessionStore {
    pool: PgPool,
}

impl PostgresSessionStore {
    pub async fn new(pool: PgPool) -> Result<Self, SessionError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS sessions (\
             sid TEXT PRIMARY KEY, \
             payload JSONB NOT NULL, \
             expires_at TEXT NOT NULL)",
        )
        .execute(&pool)
        .await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl SessionStore for PostgresSessionStore {
    async fn get(&self, session_id: &str) -> Result<Option<SessionRecord>, SessionError> {
        let row = sqlx::query("SELECT payload, expires_at FROM sessions WHERE sid = $1")
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };

        let expires_at = parse_expiry(&row.try_get::<String, _>("expires_at")?);
        if expires_at <= Utc::now() {
            sqlx::query("DELETE FROM sessions WHERE sid = $1")
                .bind(session_id)
                .execute(&self.pool)
                .await?;
            return Ok(None);
        }

        let payload: Value = row.try_get("payload")?;
        Ok(Some(SessionRecord::new(payload, expires_at)))
    }

    async fn set(&self, session_id: &str, record: SessionRecord) -> Result<(), SessionError> {
        sqlx::query(
            "INSERT INTO sessions (sid, payload, expires_at) VALUES ($1, $2, $3) \
             ON CONFLICT (sid) DO UPDATE SET payload = EXCLUDED.payload, \
             expires_at = EXCLUDED.expires_at",
        )
        .bind(session_id)
        .bind(&record.payload)
        .bind(record.expires_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn destroy(&self, session_id: &str) -> Result<(), SessionError> {
        sqlx::query("DELETE FROM sessions WHERE sid = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn touch(
        &self,
        session_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        sqlx::query("UPDATE sessions SET expires_at = $1 WHERE sid = $2")
            .bind(expires_at.to_rfc3339())
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn store() -> SqliteSessionStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        SqliteSessionStore::new(pool).await.unwrap()
    }

    #[tokio::test]
    async fn set_get_round_trip() {
        let store = store().await;
        let record = SessionRecord::new(
            json!({"user": {"email": "ana@imovia.com"}}),
            Utc::now() + Duration::hours(1),
        );
        store.set("sid", record).await.unwrap();

        let fetched = store.get("sid").await.unwrap().unwrap();
        assert_eq!(fetched.payload["user"]["email"], "ana@imovia.com");
    }

    #[tokio::test]
    async fn expired_row_deleted_on_read() {
        let store = store().await;
        let record = SessionRecord::new(json!({}), Utc::now() - Duration::seconds(1));
        store.set("sid", record).await.unwrap();

        assert!(store.get("sid").await.unwrap().is_none());
        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn set_overwrites_last_write_wins() {
        let store = store().await;
        let expiry = Utc::now() + Duration::hours(1);
        store
            .set("sid", SessionRecord::new(json!({"n": 1}), expiry))
            .await
            .unwrap();
        store
            .set("sid", SessionRecord::new(json!({"n": 2}), expiry))
            .await
            .unwrap();
        let fetched = store.get("sid").await.unwrap().unwrap();
        assert_eq!(fetched.payload["n"], 2);
    }

    #[tokio::test]
    async fn touch_missing_session_is_noop() {
        let store = store().await;
        store
            .touch("ghost", Utc::now() + Duration::hours(1))
            .await
            .unwrap();
        assert!(store.get("ghost").await.unwrap().is_none());
    }
}
