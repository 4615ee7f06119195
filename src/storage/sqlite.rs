//! Local single-file backend for development, via sqlx/SQLite.

use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};

use crate::storage::{doc_id, doc_timestamp, Dialect, Filter, StorageError, ALL_TABLES};

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(path: &str) -> Result<Self, StorageError> {
        let pool = if path == ":memory:" {
            // Each pooled connection would otherwise get its own private
            // in-memory database.
            SqlitePoolOptions::new()
                .max_connections(1)
                .connect("sqlite::memory:")
                .await?
        } else {
            let options = SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true);
            SqlitePoolOptions::new().connect_with(options).await?
        };
        tracing::info!("opened sqlite store");
        Ok(Self { pool })
    }

    /// Shared with the SQL session store so sessions land in the same file.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn ensure_schema(&self) -> Result<(), StorageError> {
        for table in ALL_TABLES {
            let ddl = format!(
                "CREATE TABLE IF NOT EXISTS \"{}\" (\
                 id TEXT PRIMARY KEY, \
                 data TEXT NOT NULL, \
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
        let sql = filter.to_sql(table, Dialect::Sqlite)?;
        let mut query = sqlx::query(&sql.query);
        for param in &sql.params {
            query = bind_value(query, param);
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| {
                let data: String = row.try_get("data")?;
                serde_json::from_str(&data).map_err(Into::into)
            })
            .collect()
    }

    pub async fn get(&self, table: &str, id: &str) -> Result<Option<Value>, StorageError> {
        Filter::validate_table(table)?;
        let sql = format!("SELECT data FROM \"{}\" WHERE id = ?", table);
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.map(|r| {
            let data: String = r.try_get("data")?;
            serde_json::from_str(&data).map_err(Into::into)
        })
        .transpose()
    }

    pub async fn insert(&self, table: &str, doc: &Value) -> Result<(), StorageError> {
        Filter::validate_table(table)?;
        let sql = format!(
            "INSERT INTO \"{}\" (id, data, created_at, updated_at) VALUES (?, ?, ?, ?)",
            table
        );
        sqlx::query(&sql)
            .bind(doc_id(doc)?)
            .bind(doc.to_string())
            .bind(doc_timestamp(doc, "created_at"))
            .bind(doc_timestamp(doc, "updated_at"))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn replace(&self, table: &str, doc: &Value) -> Result<bool, StorageError> {
        Filter::validate_table(table)?;
        let sql = format!(
            "UPDATE \"{}\" SET data = ?, updated_at = ? WHERE id = ?",
            table
        );
        let result = sqlx::query(&sql)
            .bind(doc.to_string())
            .bind(doc_timestamp(doc, "updated_at"))
            .bind(doc_id(doc)?)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(&self, table: &str, id: &str) -> Result<bool, StorageError> {
        Filter::validate_table(table)?;
        let sql = format!("DELETE FROM \"{}\" WHERE id = ?", table);
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn dump(&self, table: &str) -> Result<Vec<Value>, StorageError> {
        self.list(table, &Filter::new()).await
    }

    pub async fn restore(&self, table: &str, docs: Vec<Value>) -> Result<usize, StorageError> {
        Filter::validate_table(table)?;
        let sql = format!(
            "INSERT INTO \"{}\" (id, data, created_at, updated_at) VALUES (?, ?, ?, ?) \
             ON CONFLICT(id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
            table
        );
        let mut count = 0;
        for doc in &docs {
            sqlx::query(&sql)
                .bind(doc_id(doc)?)
                .bind(doc.to_string())
                .bind(doc_timestamp(doc, "created_at"))
                .bind(doc_timestamp(doc, "updated_at"))
                .execute(&self.pool)
                .await?;
            count += 1;
        }
        Ok(count)
    }
}

/// Bind a JSON scalar with its native SQLite type; json_extract yields
/// integers for booleans, so Bool binds as bool (stored 0/1).
fn bind_value<'q>(
    query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    value: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    match value {
        Value::Null => query.bind(Option::<String>::None),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else if let Some(f) = n.as_f64() {
                query.bind(f)
            } else {
                query.bind(n.to_string())
            }
        }
        Value::String(s) => query.bind(s.as_str()),
        other => query.bind(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::OrderDir;
    use serde_json::json;

    async fn store() -> SqliteStore {
        let store = SqliteStore::connect(":memory:").await.unwrap();
        store.ensure_schema().await.unwrap();
        store
    }

    fn doc(id: &str, status: &str, created_at: &str) -> Value {
        json!({
            "id": id,
            "status": status,
            "featured": true,
            "created_at": created_at,
            "updated_at": created_at,
        })
    }

    #[tokio::test]
    async fn insert_get_replace_delete() {
        let store = store().await;
        store
            .insert("properties", &doc("p1", "available", "2024-01-01T00:00:00Z"))
            .await
            .unwrap();

        let fetched = store.get("properties", "p1").await.unwrap().unwrap();
        assert_eq!(fetched["status"], "available");

        let mut updated = fetched.clone();
        updated["status"] = json!("sold");
        assert!(store.replace("properties", &updated).await.unwrap());
        let fetched = store.get("properties", "p1").await.unwrap().unwrap();
        assert_eq!(fetched["status"], "sold");

        assert!(store.delete("properties", "p1").await.unwrap());
        assert!(!store.delete("properties", "p1").await.unwrap());
    }

    #[tokio::test]
    async fn filters_on_json_fields() {
        let store = store().await;
        store
            .insert("properties", &doc("p1", "available", "2024-01-01T00:00:00Z"))
            .await
            .unwrap();
        store
            .insert("properties", &doc("p2", "sold", "2024-02-01T00:00:00Z"))
            .await
            .unwrap();

        let filter = Filter::new()
            .eq("status", json!("available"))
            .order_by("created_at", OrderDir::Desc);
        let docs = store.list("properties", &filter).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["id"], "p1");

        // boolean filters survive json round-trips
        let filter = Filter::new().eq("featured", json!(true));
        assert_eq!(store.list("properties", &filter).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn restore_upserts_by_id() {
        let store = store().await;
        store
            .insert("cities", &doc("c1", "x", "2024-01-01T00:00:00Z"))
            .await
            .unwrap();
        let replacement = doc("c1", "y", "2024-01-01T00:00:00Z");
        let n = store.restore("cities", vec![replacement]).await.unwrap();
        assert_eq!(n, 1);
        let fetched = store.get("cities", "c1").await.unwrap().unwrap();
        assert_eq!(fetched["status"], "y");
    }
}
