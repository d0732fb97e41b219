//! Input Item Projection
//!
//! A workflow host hands each operation an ordered list of input items, each
//! an arbitrary JSON mapping. Before any SQL is built, the requested fields
//! are projected out of every item into a [`ProjectedRecord`].
//!
//! # Absence Is Data
//! A field missing from the source item is carried as `null` rather than
//! treated as a failure. Downstream it becomes a NULL bind parameter.
//!
//! # Ordering Contract
//! A `ProjectedRecord` is an explicit ordered list of field/value pairs, not
//! a hash map. Field order always matches the requested field list, and that
//! order drives the positional argument order of the statements built from it.

use serde_json::{Map, Value};

/// One input item as supplied by the host: an arbitrary JSON mapping.
pub type InputRecord = Map<String, Value>;

/// An ordered selection of fields copied out of one input record.
///
/// Values are deep copies of the source values; mutating a projection never
/// touches the input item it was taken from.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProjectedRecord {
    entries: Vec<(String, Value)>,
}

impl ProjectedRecord {
    /// Look up a projected value by field name
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.entries.iter().find(|(name, _)| name == field).map(|(_, value)| value)
    }

    /// Field names in projection order
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Values in projection order
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, value)| value)
    }

    /// Consume the projection into a positional argument vector,
    /// preserving field order
    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        self.entries.into_iter().map(|(_, value)| value).collect()
    }

    /// Number of projected fields
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no fields were requested
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Project `fields` out of a single record.
///
/// Every requested field appears in the output in request order; fields
/// absent from the source are carried as `Value::Null`.
#[must_use]
pub fn project_one(record: &InputRecord, fields: &[String]) -> ProjectedRecord {
    let entries = fields
        .iter()
        .map(|field| (field.clone(), record.get(field).cloned().unwrap_or(Value::Null)))
        .collect();

    ProjectedRecord { entries }
}

/// Project `fields` out of every record, one projection per record,
/// preserving input order.
#[must_use]
pub fn project(records: &[InputRecord], fields: &[String]) -> Vec<ProjectedRecord> {
    records.iter().map(|record| project_one(record, fields)).collect()
}
