//! Ephemeral in-memory backend: per-table vectors behind an async lock,
//! filters evaluated by linear scan. Used by tests and demos.

use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::RwLock;

use crate::storage::{doc_id, Filter, StorageError};

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Vec<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn list(&self, table: &str, filter: &Filter) -> Result<Vec<Value>, StorageError> {
        let tables = self.tables.read().await;
        let mut docs: Vec<Value> = tables
            .get(table)
            .map(|rows| rows.iter().filter(|d| filter.matches(d)).cloned().collect())
            .unwrap_or_default();
        filter.sort(&mut docs);
        if let Some(limit) = filter.limit_value() {
            docs.truncate(limit as usize);
        }
        Ok(docs)
    }

    pub async fn get(&self, table: &str, id: &str) -> Result<Option<Value>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables.get(table).and_then(|rows| {
            rows.iter()
                .find(|d| d.get("id").and_then(Value::as_str) == Some(id))
                .cloned()
        }))
    }

    pub async fn insert(&self, table: &str, doc: Value) -> Result<(), StorageError> {
        doc_id(&doc)?;
        let mut tables = self.tables.write().await;
        tables.entry(table.to_string()).or_default().push(doc);
        Ok(())
    }

    pub async fn replace(&self, table: &str, doc: Value) -> Result<bool, StorageError> {
        let id = doc_id(&doc)?;
        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(table) else {
            return Ok(false);
        };
        match rows
            .iter_mut()
            .find(|d| d.get("id").and_then(Value::as_str) == Some(id.as_str()))
        {
            Some(slot) => {
                *slot = doc;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn delete(&self, table: &str, id: &str) -> Result<bool, StorageError> {
        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(table) else {
            return Ok(false);
        };
        let before = rows.len();
        rows.retain(|d| d.get("id").and_then(Value::as_str) != Some(id));
        Ok(rows.len() < before)
    }

    pub async fn dump(&self, table: &str) -> Result<Vec<Value>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables.get(table).cloned().unwrap_or_default())
    }

    pub async fn restore(&self, table: &str, docs: Vec<Value>) -> Result<usize, StorageError> {
        let count = docs.len();
        let mut tables = self.tables.write().await;
        let rows = tables.entry(table.to_string()).or_default();
        for doc in docs {
            let id = doc_id(&doc)?;
            rows.retain(|d| d.get("id").and_then(Value::as_str) != Some(id.as_str()));
            rows.push(doc);
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::OrderDir;
    use serde_json::json;

    fn doc(id: &str, featured: bool, created_at: &str) -> Value {
        json!({ "id": id, "featured": featured, "created_at": created_at })
    }

    #[tokio::test]
    async fn crud_round_trip() {
        let store = MemoryStore::new();
        store
            .insert("properties", doc("a", true, "2024-01-01T00:00:00Z"))
            .await
            .unwrap();

        let fetched = store.get("properties", "a").await.unwrap().unwrap();
        assert_eq!(fetched["featured"], json!(true));

        let mut updated = fetched.clone();
        updated["featured"] = json!(false);
        assert!(store.replace("properties", updated).await.unwrap());

        assert!(store.delete("properties", "a").await.unwrap());
        assert!(!store.delete("properties", "a").await.unwrap());
        assert!(store.get("properties", "a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_filters_and_orders() {
        let store = MemoryStore::new();
        store
            .insert("properties", doc("old", true, "2024-01-01T00:00:00Z"))
            .await
            .unwrap();
        store
            .insert("properties", doc("new", true, "2024-06-01T00:00:00Z"))
            .await
            .unwrap();
        store
            .insert("properties", doc("plain", false, "2024-03-01T00:00:00Z"))
            .await
            .unwrap();

        let filter = Filter::new()
            .eq("featured", json!(true))
            .order_by("created_at", OrderDir::Desc);
        let docs = store.list("properties", &filter).await.unwrap();
        let ids: Vec<_> = docs.iter().map(|d| d["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["new", "old"]);
    }

    #[tokio::test]
    async fn replace_missing_row_reports_false() {
        let store = MemoryStore::new();
        let missing = doc("ghost", false, "2024-01-01T00:00:00Z");
        assert!(!store.replace("properties", missing).await.unwrap());
    }
}
