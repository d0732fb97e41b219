//! Driver Capability Interface
//!
//! This module defines the seam between the operation assembler and the
//! database client. Anything that can connect with a credential bag and run
//! positional-parameter queries is substitutable: the shipped implementation
//! wraps the `rsfbclient` Firebird wire client, and the test suite substitutes
//! an in-memory mock.
//!
//! # Stateless Design
//! A driver value is constructed once and passed into each operation call.
//! There is no process-global driver state; connections are acquired, used,
//! and released within a single operation invocation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

// Firebird wire-client implementation
#[cfg(feature = "firebird")]
pub mod firebird;

/// One result row as a flat column/value mapping
pub type DbRow = Map<String, Value>;

/// Credential bag for the driver's connect call
///
/// The fields mirror what a Firebird client accepts. This crate passes them
/// through without interpretation; which of the optional tuning fields are
/// honored is up to the driver implementation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionParams {
    /// Server hostname
    pub host: String,

    /// Server port (driver default 3050 when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Database path or alias on the server
    pub database: String,

    /// Username
    pub user: String,

    /// Password
    /// WARNING: Sensitive data, do not log or include in error messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// SQL role to assume after connecting
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Database page size, relevant only when the driver creates databases
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,

    /// Reconnect interval in milliseconds, for drivers that auto-reconnect
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconnect_interval_ms: Option<u64>,

    /// Lowercase result column names client-side
    #[serde(default)]
    pub lowercase_keys: bool,
}

impl ConnectionParams {
    /// Create a minimal parameter set; tuning fields stay unset
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        database: impl Into<String>,
        user: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: None,
            database: database.into(),
            user: user.into(),
            password: None,
            role: None,
            page_size: None,
            reconnect_interval_ms: None,
            lowercase_keys: false,
        }
    }

    /// Set the password
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the port
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }
}

/// Result of a single statement execution
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutcome {
    /// Present when the statement produced a result set. A SELECT matching
    /// nothing is `Some` with an empty vector, which is distinct from a DML
    /// statement's `None`.
    pub rows: Option<Vec<DbRow>>,

    /// Rows affected, when the server reports a count for DML
    pub rows_affected: Option<u64>,
}

impl QueryOutcome {
    /// A statement that produced a result set
    #[must_use]
    pub fn result_set(rows: Vec<DbRow>) -> Self {
        Self { rows: Some(rows), rows_affected: None }
    }

    /// A DML statement reporting an affected-row count
    #[must_use]
    pub fn affected(count: u64) -> Self {
        Self { rows: None, rows_affected: Some(count) }
    }

    /// A statement with neither a result set nor a reported count
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Database driver capability
///
/// Implementations open one connection per call; pooling and reconnect
/// policies live behind this seam, not above it.
pub trait SqlDriver {
    /// Connection type produced by this driver
    type Conn: SqlConnection + Send;

    /// Open a connection using the supplied credential bag
    fn connect(
        &self,
        params: &ConnectionParams,
    ) -> impl std::future::Future<Output = Result<Self::Conn>> + Send;
}

/// An open database connection
///
/// `query` runs one statement. `args: None` means the statement is executed
/// without a bound-parameter array at all, which some clients treat
/// differently from an empty array; callers pass `None` whenever nothing was
/// substituted.
pub trait SqlConnection: Sized {
    /// Execute one statement, optionally with positional arguments
    fn query(
        &mut self,
        sql: &str,
        args: Option<&[Value]>,
    ) -> impl std::future::Future<Output = Result<QueryOutcome>> + Send;

    /// Release the connection
    ///
    /// Must be called on every exit path of an operation; a close failure is
    /// a secondary error that callers log and ignore.
    fn close(self) -> impl std::future::Future<Output = Result<()>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_connection_params_constructor() {
        let params = ConnectionParams::new("localhost", "/data/app.fdb", "SYSDBA")
            .with_password("masterkey")
            .with_port(3050);

        assert_eq!(params.host, "localhost");
        assert_eq!(params.database, "/data/app.fdb");
        assert_eq!(params.user, "SYSDBA");
        assert_eq!(params.password.as_deref(), Some("masterkey"));
        assert_eq!(params.port, Some(3050));
        assert!(!params.lowercase_keys);
    }

    #[test]
    fn test_connection_params_serialization_skips_unset_fields() {
        let params = ConnectionParams::new("db.example.com", "app.fdb", "reader");
        let json = serde_json::to_string(&params).unwrap();

        assert!(json.contains(r#""host":"db.example.com""#));
        assert!(!json.contains("password"));
        assert!(!json.contains("role"));
        assert!(!json.contains("page_size"));
    }

    #[test]
    fn test_connection_params_deserialization_defaults() {
        let params: ConnectionParams = serde_json::from_str(
            r#"{"host": "localhost", "database": "app.fdb", "user": "SYSDBA"}"#,
        )
        .unwrap();

        assert_eq!(params.port, None);
        assert!(!params.lowercase_keys);
    }

    #[test]
    fn test_query_outcome_constructors() {
        let mut row = DbRow::new();
        row.insert("id".to_string(), json!(1));

        let with_rows = QueryOutcome::result_set(vec![row]);
        assert_eq!(with_rows.rows.as_ref().map(Vec::len), Some(1));
        assert!(with_rows.rows_affected.is_none());

        let affected = QueryOutcome::affected(3);
        assert!(affected.rows.is_none());
        assert_eq!(affected.rows_affected, Some(3));

        let empty = QueryOutcome::empty();
        assert!(empty.rows.is_none());
        assert!(empty.rows_affected.is_none());
    }

    #[test]
    fn test_empty_result_set_is_distinct_from_no_result_set() {
        let empty_select = QueryOutcome::result_set(Vec::new());
        let dml = QueryOutcome::affected(0);

        assert!(empty_select.rows.is_some());
        assert!(dml.rows.is_none());
        assert_ne!(empty_select, dml);
    }
}
