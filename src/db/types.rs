//! Query result types for glance-cql.
//!
//! Defines the structures used to represent rows coming back from the
//! cluster and the normalized per-statement results handed to callers.

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::catalog::Table;

/// A row of data keyed by column name.
///
/// Keys iterate in name order. Result-set column order is carried by
/// [`RawResult::columns`] and [`QueryResult::columns`].
pub type Row = BTreeMap<String, Value>;

/// Represents a single value from a CQL result set.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    /// NULL / unset value.
    #[default]
    Null,

    /// Boolean value.
    Bool(bool),

    /// Signed integer (tinyint through bigint and counters).
    Int(i64),

    /// Floating point number.
    Float(f64),

    /// Text, ascii, uuid, inet and any value rendered as text.
    String(String),

    /// Blob data.
    #[serde(serialize_with = "serialize_bytes")]
    Bytes(Vec<u8>),

    /// List, set or tuple.
    List(Vec<Value>),

    /// Map entries in driver order.
    Map(Vec<(Value, Value)>),
}

fn serialize_bytes<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&B64.encode(bytes))
}

impl Value {
    /// Returns the value as an integer if it is one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value as a string slice if it is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Converts the value to a string representation.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
            Value::Bytes(b) => format!("0x{}", b.iter().map(|x| format!("{x:02x}")).collect::<String>()),
            Value::List(items) => format!(
                "[{}]",
                items
                    .iter()
                    .map(Value::to_display_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Value::Map(entries) => format!(
                "{{{}}}",
                entries
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k.to_display_string(), v.to_display_string()))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

/// What a session hands back for one statement or batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawResult {
    /// Column names in result-set order.
    pub columns: Vec<String>,
    /// Returned rows.
    pub rows: Vec<Row>,
    /// Number of rows returned.
    pub row_count: usize,
}

impl RawResult {
    /// Creates a raw result from column names and rows.
    pub fn with_rows(columns: Vec<String>, rows: Vec<Row>) -> Self {
        let row_count = rows.len();
        Self {
            columns,
            rows,
            row_count,
        }
    }

    /// A result with no columns and no rows (writes, DDL).
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Pagination details attached to a record preview.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Total row count, or the fallback upper bound when counting was too slow.
    pub total: u64,
    /// Zero-based page number.
    pub page: u64,
    /// Rows per page.
    pub page_size: u64,
    /// The unrendered fetch template.
    pub base_query_text: String,
    /// The table the preview was taken from.
    pub query_params: Table,
}

/// Normalized result of one executed unit (statement or batch).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    /// Identifier of the connection that ran the unit.
    pub connection_id: String,
    /// Column names in result-set order.
    pub columns: Vec<String>,
    /// Returned rows.
    pub rows: Vec<Row>,
    /// Text of the unit as it was sent (full batch text for batches).
    pub query_text: String,
    /// True when the unit failed.
    pub is_error: bool,
    /// Human-readable status or error messages.
    pub messages: Vec<String>,
    /// Caller-supplied correlation id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Fresh id for this result.
    pub result_id: Uuid,
    /// Present only on record previews.
    #[serde(flatten)]
    pub pagination: Option<Pagination>,
}

impl QueryResult {
    /// Builds a success result from a raw driver result.
    pub fn success(
        connection_id: impl Into<String>,
        query_text: impl Into<String>,
        raw: RawResult,
        request_id: Option<String>,
    ) -> Self {
        Self {
            connection_id: connection_id.into(),
            messages: vec![format!("Query ok with {} result(s)", raw.row_count)],
            columns: raw.columns,
            rows: raw.rows,
            query_text: query_text.into(),
            is_error: false,
            request_id,
            result_id: Uuid::new_v4(),
            pagination: None,
        }
    }

    /// Builds an error result carrying the failure description.
    pub fn error(
        connection_id: impl Into<String>,
        query_text: impl Into<String>,
        message: impl Into<String>,
        request_id: Option<String>,
    ) -> Self {
        Self {
            connection_id: connection_id.into(),
            columns: Vec::new(),
            rows: Vec::new(),
            query_text: query_text.into(),
            is_error: true,
            messages: vec![message.into()],
            request_id,
            result_id: Uuid::new_v4(),
            pagination: None,
        }
    }
}
