//! Remote managed-database backend for production, via sqlx/Postgres.
//!
//! Documents live in a JSONB column; `data->>'field'` comparisons receive
//! their parameters as text, so JSON scalars are coerced before binding.

use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};

use crate::storage::{doc_id, doc_timestamp, Dialect, Filter, StorageError, ALL_TABLES};

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub async fn connect(url: &str) -> Result<Self, StorageError> {
        let parsed = url::Url::parse(url)
            .map_err(|_| StorageError::ConnectionError("invalid database URL".to_string()))?;
        if !matches!(parsed.scheme(), "postgres" | "postgresql") {
            return Err(StorageError::ConnectionError(format!(
                "unsupported database URL scheme: {}",
                parsed.scheme()
            )));
        }

        let pool = PgPoolOptions::new().max_connections(10).connect(url).await?;
        tracing::info!("connected to remote database");
        Ok(Self { pool })
    }

    /// Shared with the SQL session store.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn ensure_schema(&self) -> Result<(), StorageError> {
        for table in ALL_TABLES {
            let ddl = format!(
                "CREATE TABLE IF NOT EXISTS \"{}\" (\
                 id TEXT PRIMARY KEY, \
                 data JSONB NOT NULL, \
                 created_at TEXT NOT NULL, \
                 updated_at TEXT NOT NULL)",
                table
            );
            sqlx::query(&ddl).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub async fn health(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn list(&self, table: &str, filter: &Filter) -> Result<Vec<Value>, StorageError> {
        let sql = filter.to_sql(table, Dialect::Postgres)?;
        let mut query = sqlx::query(&sql.query);
        for param in &sql.params {
            query = query.bind(text_param(param));
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| row.try_get::<Value, _>("data").map_err(Into::into))
            .collect()
    }

    pub async fn get(&self, table: &str, id: &str) -> Result<Option<Value>, StorageError> {
        Filter::validate_table(table)?;
        let sql = format!("SELECT data FROM \"{}\" WHERE id = $1", table);
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.map(|r| r.try_get::<Value, _>("data").map_err(Into::into))
            .transpose()
    }

    pub async fn insert(&self, table: &str, doc: &Value) -> Result<(), StorageError> {
        Filter::validate_table(table)?;
        let sql = format!(
            "INSERT INTO \"{}\" (id, data, created_at, updated_at) VALUES ($1, $2, $3, $4)",
            table
        );
        sqlx::query(&sql)
            .bind(doc_id(doc)?)
            .bind(doc)
            .bind(doc_timestamp(doc, "created_at"))
            .bind(doc_timestamp(doc, "updated_at"))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn replace(&self, table: &str, doc: &Value) -> Result<bool, StorageError> {
        Filter::validate_table(table)?;
        let sql = format!(
            "UPDATE \"{}\" SET data = $1, updated_at = $2 WHERE id = $3",
            table
        );
        let result = sqlx::query(&sql)
            .bind(doc)
            .bind(doc_timestamp(doc, "updated_at"))
            .bind(doc_id(doc)?)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(&self, table: &str, id: &str) -> Result<bool, StorageError> {
        Filter::validate_table(table)?;
        let sql = format!("DELETE FROM \"{}\" WHERE id = $1", table);
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn dump(&self, table: &str) -> Result<Vec<Value>, StorageError> {
        self.list(table, &Filter::new()).await
    }

    pub async fn restore(&self, table: &str, docs: Vec<Value>) -> Result<usize, StorageError> {
        Filter::validate_table(table)?;
        let sql = format!(
            "INSERT INTO \"{}\" (id, data, created_at, updated_at) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (id) DO UPDATE SET data = EXCLUDED.data, updated_at = EXCLUDED.updated_at",
            table
        );
        let mut count = 0;
        for doc in &docs {
            sqlx::query(&sql)
                .bind(doc_id(doc)?)
                .bind(doc)
                .bind(doc_timestamp(doc, "created_at"))
                .bind(doc_timestamp(doc, "updated_at"))
                .execute(&self.pool)
                .await?;
            count += 1;
        }
        Ok(count)
    }
}

/// `data->>'field'` yields text; coerce the comparison value to match.
fn text_param(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_params_match_jsonb_text_extraction() {
        assert_eq!(text_param(&json!("available")), "available");
        assert_eq!(text_param(&json!(true)), "true");
        assert_eq!(text_param(&json!(42)), "42");
    }

    #[test]
    fn rejects_non_postgres_urls() {
        let err = futures_executor(PostgresStore::connect("mysql://h/db"));
        assert!(matches!(err, Err(StorageError::ConnectionError(_))));
    }

    fn futures_executor<F: std::future::Future>(fut: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(fut)
    }
}
