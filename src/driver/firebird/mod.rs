//! Firebird Driver Implementation
//!
//! This module implements the driver capability traits over the `rsfbclient`
//! pure-Rust wire client.
//!
//! # Implementation Notes
//! - Uses the pure-Rust protocol implementation (no native libfbclient)
//! - The wire client is synchronous; calls run inline inside the async
//!   trait methods, the same shape as a file-backed engine
//! - Statements are routed by a result-set heuristic: SELECT-like text is
//!   fetched row-by-row, everything else runs on the execute path and
//!   reports the affected-row count
//! - Binary column data is Base64-encoded for JSON safety
//! - Timestamps are rendered as ISO 8601 strings
//! - NaN/Infinity floats become JSON null
//! - The `lowercase_keys` credential flag lowercases column names client-side
//! - `role`, `page_size` and `reconnect_interval_ms` are accepted in the
//!   credential bag but not applied by this client

use rsfbclient::prelude::*;
use rsfbclient::{Row, SimpleConnection, SqlType};
use serde_json::Value;

use crate::driver::{ConnectionParams, DbRow, QueryOutcome, SqlConnection, SqlDriver};
use crate::error::{FireflowError, Result};

/// Firebird driver handle; construct once and pass into operation calls
#[derive(Debug, Clone, Copy, Default)]
pub struct Firebird;

/// An open Firebird connection
pub struct FirebirdSession {
    conn: SimpleConnection,
    lowercase_keys: bool,
}

impl SqlDriver for Firebird {
    type Conn = FirebirdSession;

    async fn connect(&self, params: &ConnectionParams) -> Result<FirebirdSession> {
        let mut builder = rsfbclient::builder_pure_rust();
        builder.host(params.host.as_str());
        builder.db_name(params.database.as_str());
        builder.user(params.user.as_str());

        if let Some(port) = params.port {
            builder.port(port);
        }
        if let Some(password) = &params.password {
            builder.pass(password.as_str());
        }

        let conn = builder.connect().map_err(|e| {
            FireflowError::connection_failed(format!("Failed to connect to Firebird: {e}"))
        })?;

        Ok(FirebirdSession { conn: conn.into(), lowercase_keys: params.lowercase_keys })
    }
}

impl SqlConnection for FirebirdSession {
    async fn query(&mut self, sql: &str, args: Option<&[Value]>) -> Result<QueryOutcome> {
        let bound: Vec<SqlType> =
            args.map(|values| values.iter().map(json_to_sql).collect()).unwrap_or_default();

        if returns_rows(sql) {
            let rows: Vec<Row> = self
                .conn
                .query(sql, bound)
                .map_err(|e| FireflowError::query_failed(format!("Failed to execute query: {e}")))?;

            let rows = rows.into_iter().map(|row| row_to_json(row, self.lowercase_keys)).collect();
            Ok(QueryOutcome::result_set(rows))
        } else {
            let affected = self
                .conn
                .execute(sql, bound)
                .map_err(|e| FireflowError::query_failed(format!("Failed to execute query: {e}")))?;

            Ok(QueryOutcome::affected(affected as u64))
        }
    }

    async fn close(self) -> Result<()> {
        self.conn
            .close()
            .map_err(|e| FireflowError::connection_failed(format!("Failed to disconnect: {e}")))
    }
}

/// Decide whether a statement produces a result set.
///
/// Firebird has no cheap prepare-then-check surface here, so this routes on
/// the statement text: SELECT, SELECT-bearing CTEs, RETURNING clauses and
/// EXECUTE BLOCK ... RETURNS are fetched; everything else is executed.
fn returns_rows(sql: &str) -> bool {
    let upper = sql.trim().to_uppercase();

    upper.starts_with("SELECT")
        || (upper.starts_with("WITH") && upper.contains("SELECT"))
        || (upper.starts_with("EXECUTE BLOCK") && upper.contains("RETURNS"))
        || upper.contains(" RETURNING ")
}

/// Convert a JSON argument to a Firebird bind value
fn json_to_sql(value: &Value) -> SqlType {
    match value {
        Value::Null => SqlType::Null,
        Value::Bool(b) => SqlType::Boolean(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                SqlType::Integer(i)
            } else {
                n.as_f64().map_or(SqlType::Null, SqlType::Floating)
            }
        }
        Value::String(s) => SqlType::Text(s.clone()),
        // Structured values are bound as their JSON text
        other @ (Value::Array(_) | Value::Object(_)) => SqlType::Text(other.to_string()),
    }
}

/// Convert a Firebird column value to JSON
fn sql_to_json(value: SqlType) -> Value {
    match value {
        SqlType::Null => Value::Null,
        SqlType::Boolean(b) => Value::Bool(b),
        SqlType::Integer(i) => Value::Number(i.into()),
        SqlType::Floating(f) => {
            // NaN/Infinity have no JSON representation
            serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number)
        }
        SqlType::Text(s) => Value::String(s),
        SqlType::Timestamp(ts) => {
            Value::String(ts.format("%Y-%m-%dT%H:%M:%S%.6f").to_string())
        }
        SqlType::Binary(bytes) => {
            use base64::Engine;
            Value::String(base64::engine::general_purpose::STANDARD.encode(bytes))
        }
        _ => Value::Null,
    }
}

/// Flatten a driver row into a column/value mapping
fn row_to_json(row: Row, lowercase_keys: bool) -> DbRow {
    let mut map = DbRow::new();

    for col in row.cols {
        let name = if lowercase_keys { col.name.to_lowercase() } else { col.name };
        map.insert(name, sql_to_json(col.value));
    }

    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_returns_rows_heuristic() {
        assert!(returns_rows("SELECT * FROM t"));
        assert!(returns_rows("  select 1 from rdb$database"));
        assert!(returns_rows("WITH x AS (SELECT 1 AS n FROM rdb$database) SELECT n FROM x"));
        assert!(returns_rows("INSERT INTO t(a) VALUES (?) RETURNING id"));
        assert!(returns_rows("EXECUTE BLOCK RETURNS (n INT) AS BEGIN n = 1; SUSPEND; END"));

        assert!(!returns_rows("INSERT INTO t(a) VALUES (?)"));
        assert!(!returns_rows("UPDATE t SET a = ? WHERE id = ?"));
        assert!(!returns_rows("DELETE FROM t"));
    }

    #[test]
    fn test_json_to_sql_scalars() {
        assert_eq!(json_to_sql(&Value::Null), SqlType::Null);
        assert_eq!(json_to_sql(&json!(true)), SqlType::Boolean(true));
        assert_eq!(json_to_sql(&json!(42)), SqlType::Integer(42));
        assert_eq!(json_to_sql(&json!(-7)), SqlType::Integer(-7));
        assert_eq!(json_to_sql(&json!(1.5)), SqlType::Floating(1.5));
        assert_eq!(json_to_sql(&json!("abc")), SqlType::Text("abc".to_string()));
    }

    #[test]
    fn test_json_to_sql_structured_values_bind_as_text() {
        assert_eq!(
            json_to_sql(&json!({"a": 1})),
            SqlType::Text(r#"{"a":1}"#.to_string())
        );
        assert_eq!(json_to_sql(&json!([1, 2])), SqlType::Text("[1,2]".to_string()));
    }

    #[test]
    fn test_sql_to_json_scalars() {
        assert_eq!(sql_to_json(SqlType::Null), Value::Null);
        assert_eq!(sql_to_json(SqlType::Integer(5)), json!(5));
        assert_eq!(sql_to_json(SqlType::Text("x".to_string())), json!("x"));
        assert_eq!(sql_to_json(SqlType::Boolean(false)), json!(false));
    }

    #[test]
    fn test_sql_to_json_nan_becomes_null() {
        assert_eq!(sql_to_json(SqlType::Floating(f64::NAN)), Value::Null);
        assert_eq!(sql_to_json(SqlType::Floating(f64::INFINITY)), Value::Null);
    }

    #[test]
    fn test_sql_to_json_binary_is_base64() {
        let value = sql_to_json(SqlType::Binary(vec![0xde, 0xad, 0xbe, 0xef]));
        assert_eq!(value, json!("3q2+7w=="));
    }

    // Note: connection tests require a running Firebird server and are
    // exercised end-to-end by the host deployment, not in this suite.
}
