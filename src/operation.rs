//! Operation Assembly
//!
//! This module composes the item projector and the query rewriter into the
//! three operation shapes a host can request:
//! - `executeQuery` - one parameterized query per input item
//! - `insert` - one batched multi-row INSERT for all items
//! - `update` - one keyed UPDATE per item
//!
//! # Connection Lifecycle
//! Exactly one connection is acquired per operation invocation and released
//! on every exit path. A close failure is a logged-and-ignored secondary
//! failure that never masks the primary error.
//!
//! # Statelessness
//! Nothing here carries state across calls; every invocation is fully
//! determined by its inputs.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::driver::{ConnectionParams, QueryOutcome, SqlConnection, SqlDriver};
use crate::error::{FireflowError, Result};
use crate::items::{project_one, InputRecord};
use crate::output::{error_record, OutputRecord};
use crate::query::{parse_name_list, rewrite};

/// A host parameter that may resolve to a different value per input item
///
/// Hosts evaluate expressions per item, so a "single" parameter like the
/// query template can legitimately differ from item to item. `Fixed` carries
/// one value for the whole invocation; `PerItem` carries one value per item
/// and fails on an out-of-range index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemBound<T> {
    /// One value shared by every item
    Fixed(T),

    /// One value per item, addressed by item index
    PerItem(Vec<T>),
}

impl<T> ItemBound<T> {
    /// Resolve the value for the item at `index`
    pub fn get(&self, index: usize) -> Result<&T> {
        match self {
            Self::Fixed(value) => Ok(value),
            Self::PerItem(values) => values.get(index).ok_or_else(|| {
                FireflowError::invalid_input(format!("No value for item index {index}"))
            }),
        }
    }
}

/// The three SQL operation shapes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "camelCase")]
pub enum SqlOperation {
    /// Run a raw parameterized query once per input item
    #[serde(rename_all = "camelCase")]
    ExecuteQuery {
        /// SQL template with `:name` placeholders, possibly per-item
        query: ItemBound<String>,

        /// Comma-separated declared parameter names. Resolved once for the
        /// whole invocation, even when the template varies per item.
        #[serde(default)]
        params: String,
    },

    /// Insert all input items with a single multi-row statement
    #[serde(rename_all = "camelCase")]
    Insert {
        /// Target table name
        table: String,

        /// Comma-separated column names
        columns: String,
    },

    /// Update each input item, matched on a key column
    #[serde(rename_all = "camelCase")]
    Update {
        /// Target table name
        table: String,

        /// Column matched in the WHERE clause; always updated in the SET
        /// clause as well
        update_key: String,

        /// Comma-separated column names
        columns: String,
    },
}

impl SqlOperation {
    /// Operation kind tag, as used on the job surface
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ExecuteQuery { .. } => "executeQuery",
            Self::Insert { .. } => "insert",
            Self::Update { .. } => "update",
        }
    }

    /// Deserialize an operation from a job document.
    ///
    /// An unknown `operation` tag is reported as an unsupported-operation
    /// error rather than a generic parse failure.
    pub fn from_value(value: &Value) -> Result<Self> {
        let kind = value
            .get("operation")
            .and_then(Value::as_str)
            .ok_or_else(|| FireflowError::invalid_input("Job is missing an 'operation' field"))?;

        match kind {
            "executeQuery" | "insert" | "update" => serde_json::from_value(value.clone())
                .map_err(|e| {
                    FireflowError::invalid_input(format!("Invalid '{kind}' operation: {e}"))
                }),
            other => Err(FireflowError::unsupported_operation(other)),
        }
    }
}

/// Options governing a single operation invocation
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Capture a failure as a single `{"error": ...}` output record instead
    /// of aborting the invocation
    pub continue_on_fail: bool,
}

/// Execute one operation invocation.
///
/// With `continue_on_fail` set, any failure is converted into a single
/// error record and the invocation reports success; otherwise the error
/// propagates and partial results are discarded.
pub async fn run<D: SqlDriver>(
    driver: &D,
    credentials: &ConnectionParams,
    operation: &SqlOperation,
    items: &[InputRecord],
    options: RunOptions,
) -> Result<Vec<OutputRecord>> {
    match execute(driver, credentials, operation, items).await {
        Ok(records) => Ok(records),
        Err(err) if options.continue_on_fail => {
            warn!(error = %err, operation = operation.kind(), "operation failed, continuing");
            Ok(vec![error_record(&err.message())])
        }
        Err(err) => Err(err),
    }
}

/// Acquire a scoped connection, dispatch, and release on every exit path
async fn execute<D: SqlDriver>(
    driver: &D,
    credentials: &ConnectionParams,
    operation: &SqlOperation,
    items: &[InputRecord],
) -> Result<Vec<OutputRecord>> {
    let mut conn = driver.connect(credentials).await?;

    let outcome = match operation {
        SqlOperation::ExecuteQuery { query, params } => {
            execute_query(&mut conn, query, params, items).await
        }
        SqlOperation::Insert { table, columns } => insert(&mut conn, table, columns, items).await,
        SqlOperation::Update { table, update_key, columns } => {
            update(&mut conn, table, update_key, columns, items).await
        }
    };

    if let Err(close_err) = conn.close().await {
        // Secondary failure; the primary outcome wins either way.
        warn!(error = %close_err, "failed to release connection");
    }

    outcome
}

/// One parameterized query per input item
async fn execute_query<C: SqlConnection>(
    conn: &mut C,
    query: &ItemBound<String>,
    params: &str,
    items: &[InputRecord],
) -> Result<Vec<OutputRecord>> {
    // One shared parameter-name declaration across all items, even when the
    // templates themselves differ per item.
    let param_names = parse_name_list(params);
    let mut output = Vec::new();

    for (index, item) in items.iter().enumerate() {
        let template = query.get(index)?;
        let values = project_one(item, &param_names);
        let rewritten = rewrite(template, &param_names, &values)?;

        debug!(bound = rewritten.args.len(), "executing query");
        let outcome = if rewritten.is_unbound() {
            // Nothing was substituted: run the raw text with no parameter
            // array, which some drivers treat differently from an empty one.
            conn.query(template, None).await?
        } else {
            conn.query(&rewritten.sql, Some(&rewritten.args)).await?
        };

        push_outcome(&mut output, outcome);
    }

    Ok(output)
}

/// One batched multi-row INSERT for all items
async fn insert<C: SqlConnection>(
    conn: &mut C,
    table: &str,
    columns: &str,
    items: &[InputRecord],
) -> Result<Vec<OutputRecord>> {
    let column_names = parse_name_list(columns);
    if column_names.is_empty() {
        return Err(FireflowError::invalid_input("Insert requires at least one column"));
    }
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let sql = build_insert_sql(table, &column_names, items.len());

    let mut args = Vec::with_capacity(items.len() * column_names.len());
    for item in items {
        args.extend(project_one(item, &column_names).into_values());
    }

    debug!(records = items.len(), "executing batched insert");
    let outcome = conn.query(&sql, Some(&args)).await?;

    let mut output = Vec::new();
    push_outcome(&mut output, outcome);
    Ok(output)
}

/// One keyed UPDATE per item
async fn update<C: SqlConnection>(
    conn: &mut C,
    table: &str,
    update_key: &str,
    columns: &str,
    items: &[InputRecord],
) -> Result<Vec<OutputRecord>> {
    let key = update_key.trim();
    if key.is_empty() {
        return Err(FireflowError::invalid_input("Update requires an update key"));
    }

    let mut column_names = parse_name_list(columns);
    // The key is always part of the SET list; prepend it when omitted.
    if !column_names.iter().any(|column| column == key) {
        column_names.insert(0, key.to_string());
    }

    let sql = build_update_sql(table, &column_names, key);
    let mut output = Vec::new();

    for item in items {
        let values = project_one(item, &column_names);
        let key_value = values.get(key).cloned().unwrap_or(Value::Null);

        // Projected column values in declared order, then the key value
        // again for the WHERE binding.
        let mut args = values.into_values();
        args.push(key_value);

        let outcome = conn.query(&sql, Some(&args)).await?;
        push_outcome(&mut output, outcome);
    }

    Ok(output)
}

/// Build the multi-row INSERT statement for `record_count` tuples
fn build_insert_sql(table: &str, columns: &[String], record_count: usize) -> String {
    let tuple = format!("({})", vec!["?"; columns.len()].join(","));
    let tuples = vec![tuple.as_str(); record_count].join(",");

    format!("INSERT INTO {}({}) VALUES {};", table, columns.join(","), tuples)
}

/// Build the shared UPDATE statement for one keyed record
fn build_update_sql(table: &str, columns: &[String], key: &str) -> String {
    let assignments =
        columns.iter().map(|column| format!("{column} = ?")).collect::<Vec<_>>().join(",");

    format!("UPDATE {table} SET {assignments} WHERE {key} = ?;")
}

/// Flatten one statement outcome into the output stream
///
/// Result-set rows are concatenated in order; a statement with no result set
/// contributes a single placeholder record carrying the affected-row count
/// when the driver reported one.
fn push_outcome(output: &mut Vec<OutputRecord>, outcome: QueryOutcome) {
    match outcome.rows {
        Some(rows) => output.extend(rows),
        None => {
            let mut record = OutputRecord::new();
            if let Some(count) = outcome.rows_affected {
                record.insert("rows_affected".to_string(), Value::from(count));
            }
            output.push(record);
        }
    }
}
