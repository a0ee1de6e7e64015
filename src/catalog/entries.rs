//! Catalog entry types for glance-cql.
//!
//! Represents keyspaces, tables and columns as listed by the schema catalog.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A keyspace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Keyspace {
    /// Keyspace name.
    pub name: String,
}

impl Keyspace {
    /// Creates a keyspace with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for Keyspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A table inside a keyspace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Table {
    /// Table name.
    pub name: String,

    /// Owning keyspace.
    pub keyspace: String,
}

impl Table {
    /// Creates a table reference.
    pub fn new(keyspace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keyspace: keyspace.into(),
        }
    }

    /// Parses `keyspace.table`.
    pub fn parse_qualified(s: &str) -> Option<Self> {
        let (keyspace, name) = s.split_once('.')?;
        if keyspace.is_empty() || name.is_empty() || name.contains('.') {
            return None;
        }
        Some(Self::new(keyspace, name))
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.keyspace, self.name)
    }
}

/// A column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    /// Column name.
    pub name: String,

    /// Owning keyspace.
    pub keyspace: String,

    /// Owning table.
    pub table: String,

    /// CQL type name (normalized for legacy clusters).
    pub data_type: String,

    /// True for partition key columns.
    pub is_partition_key: bool,

    /// True for any key column (partition or clustering).
    pub is_primary_key: bool,

    /// True for regular (non-key) columns.
    pub is_nullable: bool,
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let annotations = [
            self.is_partition_key.then_some("PARTITION KEY"),
            (self.is_primary_key && !self.is_partition_key).then_some("CLUSTERING"),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>();

        if annotations.is_empty() {
            write!(f, "{}: {}", self.name, self.data_type)
        } else {
            write!(f, "{}: {} ({})", self.name, self.data_type, annotations.join(", "))
        }
    }
}

/// One entry produced by a catalog listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CatalogEntry {
    Keyspace(Keyspace),
    Table(Table),
    Column(Column),
}

impl fmt::Display for CatalogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keyspace(k) => write!(f, "{k}"),
            Self::Table(t) => write!(f, "{t}"),
            Self::Column(c) => write!(f, "{c}"),
        }
    }
}

/// A node of the schema explorer tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExplorerNode {
    /// The connection itself; children are keyspaces.
    Connection,
    /// Children are the keyspace's tables.
    Keyspace(Keyspace),
    /// Children are the table's columns.
    Table(Table),
    /// Leaf.
    Column(Column),
}

/// Narrows a column search to matching tables.
///
/// Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableFilter {
    /// Keyspace the column must belong to.
    pub keyspace: Option<String>,
    /// Table the column must belong to.
    pub table: Option<String>,
}

impl TableFilter {
    /// Returns true if the column belongs to a matching table.
    pub fn matches(&self, column: &Column) -> bool {
        self.keyspace.as_deref().map_or(true, |k| k == column.keyspace)
            && self.table.as_deref().map_or(true, |t| t == column.table)
    }
}
