//! List filtering shared by all storage backends.
//!
//! A `Filter` holds equality conditions, an ordering and an optional limit.
//! The SQL backends compile it to a parameterized query over the JSON `data`
//! column; the memory backend evaluates it in-process.

use serde_json::Value;

use crate::entities::OrderDir;
use crate::storage::StorageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    Postgres,
}

/// Generated SQL plus its positional parameters.
#[derive(Debug)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<Value>,
}

#[derive(Debug, Clone, Default)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
    order: Option<(String, OrderDir)>,
    limit: Option<i64>,
}

// Timestamps live in dedicated columns; everything else is inside the JSON
// document.
const COLUMN_FIELDS: &[&str] = &["created_at", "updated_at"];

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: Value) -> Self {
        self.conditions.push((field.into(), value));
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, dir: OrderDir) -> Self {
        self.order = Some((field.into(), dir));
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit.max(0));
        self
    }

    /// Table names are interpolated into DDL and point queries; validate them
    /// with the same identifier rules as filter fields.
    pub fn validate_table(name: &str) -> Result<(), StorageError> {
        Self::validate_identifier(name)
    }

    /// Reject anything that could smuggle SQL through an identifier position.
    fn validate_identifier(name: &str) -> Result<(), StorageError> {
        let ok = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if ok {
            Ok(())
        } else {
            Err(StorageError::InvalidField(name.to_string()))
        }
    }

    pub fn to_sql(&self, table: &str, dialect: Dialect) -> Result<SqlResult, StorageError> {
        Self::validate_identifier(table)?;

        let mut clauses = Vec::new();
        let mut params = Vec::new();
        for (idx, (field, value)) in self.conditions.iter().enumerate() {
            Self::validate_identifier(field)?;
            let lhs = if COLUMN_FIELDS.contains(&field.as_str()) {
                format!("\"{}\"", field)
            } else {
                match dialect {
                    Dialect::Sqlite => format!("json_extract(data, '$.{}')", field),
                    Dialect::Postgres => format!("data->>'{}'", field),
                }
            };
            let placeholder = match dialect {
                Dialect::Sqlite => "?".to_string(),
                Dialect::Postgres => format!("${}", idx + 1),
            };
            clauses.push(format!("{} = {}", lhs, placeholder));
            params.push(value.clone());
        }

        let order_clause = match &self.order {
            Some((field, dir)) => {
                Self::validate_identifier(field)?;
                let expr = if COLUMN_FIELDS.contains(&field.as_str()) {
                    format!("\"{}\"", field)
                } else {
                    // display_order and friends are numeric JSON fields
                    match dialect {
                        Dialect::Sqlite => {
                            format!("CAST(json_extract(data, '$.{}') AS INTEGER)", field)
                        }
                        Dialect::Postgres => format!("((data->>'{}')::bigint)", field),
                    }
                };
                let dir = match dir {
                    OrderDir::Asc => "ASC",
                    OrderDir::Desc => "DESC",
                };
                format!("ORDER BY {} {}", expr, dir)
            }
            None => String::new(),
        };

        let query = [
            format!("SELECT data FROM \"{}\"", table),
            if clauses.is_empty() {
                String::new()
            } else {
                format!("WHERE {}", clauses.join(" AND "))
            },
            order_clause,
            self.limit
                .map(|n| format!("LIMIT {}", n))
                .unwrap_or_default(),
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        Ok(SqlResult { query, params })
    }

    /// In-process evaluation for the memory backend.
    pub fn matches(&self, doc: &Value) -> bool {
        self.conditions
            .iter()
            .all(|(field, value)| doc.get(field) == Some(value))
    }

    /// In-process ordering for the memory backend.
    pub fn sort(&self, docs: &mut [Value]) {
        let Some((field, dir)) = &self.order else {
            return;
        };
        docs.sort_by(|a, b| {
            let av = a.get(field);
            let bv = b.get(field);
            let ord = match (av.and_then(Value::as_i64), bv.and_then(Value::as_i64)) {
                (Some(x), Some(y)) => x.cmp(&y),
                // Timestamps serialize at fixed width (entities::time), so
                // string comparison is chronological
                _ => av
                    .and_then(Value::as_str)
                    .unwrap_or("")
                    .cmp(bv.and_then(Value::as_str).unwrap_or("")),
            };
            match dir {
                OrderDir::Asc => ord,
                OrderDir::Desc => ord.reverse(),
            }
        });
    }

    pub fn limit_value(&self) -> Option<i64> {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sqlite_sql_uses_json_extract() {
        let filter = Filter::new()
            .eq("featured", json!(true))
            .order_by("created_at", OrderDir::Desc);
        let sql = filter.to_sql("properties", Dialect::Sqlite).unwrap();
        assert_eq!(
            sql.query,
            "SELECT data FROM \"properties\" WHERE json_extract(data, '$.featured') = ? ORDER BY \"created_at\" DESC"
        );
        assert_eq!(sql.params, vec![json!(true)]);
    }

    #[test]
    fn postgres_sql_numbers_placeholders() {
        let filter = Filter::new()
            .eq("status", json!("available"))
            .eq("featured", json!(true))
            .order_by("display_order", OrderDir::Asc)
            .limit(10);
        let sql = filter.to_sql("properties", Dialect::Postgres).unwrap();
        assert_eq!(
            sql.query,
            "SELECT data FROM \"properties\" WHERE data->>'status' = $1 AND data->>'featured' = $2 ORDER BY ((data->>'display_order')::bigint) ASC LIMIT 10"
        );
        assert_eq!(sql.params.len(), 2);
    }

    #[test]
    fn rejects_hostile_identifiers() {
        let filter = Filter::new().eq("slug; DROP TABLE cities", json!("x"));
        assert!(filter.to_sql("cities", Dialect::Sqlite).is_err());
        assert!(Filter::new().to_sql("cities\"", Dialect::Postgres).is_err());
    }

    #[test]
    fn in_process_match_and_sort() {
        let filter = Filter::new()
            .eq("active", json!(true))
            .order_by("display_order", OrderDir::Asc);
        let mut docs = vec![
            json!({"name": "b", "active": true, "display_order": 2}),
            json!({"name": "c", "active": false, "display_order": 0}),
            json!({"name": "a", "active": true, "display_order": 1}),
        ];
        docs.retain(|d| filter.matches(d));
        filter.sort(&mut docs);
        let names: Vec<_> = docs.iter().map(|d| d["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
