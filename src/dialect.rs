//! Schema dialect detection.
//!
//! Cassandra 3.0 moved schema metadata from `system.schema_*` tables to the
//! `system_schema` keyspace and switched column types from Java marshal
//! class names to CQL type names. Each connection is probed once to pick the
//! statement set matching the cluster.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, info};

use crate::catalog::Table;
use crate::db::CqlSession;

/// Statement used to check for the `system_schema` keyspace.
pub const PROBE_QUERY: &str = "SELECT keyspace_name FROM system_schema.tables LIMIT 1";

static MARSHAL_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w+\.|Type\b").expect("marshal pattern is valid"));

/// Logical operations that have a dialect-specific statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    FetchKeyspaces,
    FetchTables,
    FetchColumns,
    DescribeTable,
    FetchRecords,
    CountRecords,
}

/// Statement templates for one dialect.
///
/// Templates use `{keyspace}`, `{table}` and `{limit}` placeholders.
#[derive(Debug, PartialEq, Eq)]
pub struct QuerySet {
    fetch_keyspaces: &'static str,
    fetch_tables: &'static str,
    fetch_columns: &'static str,
    describe_table: &'static str,
    fetch_records: &'static str,
    count_records: &'static str,
}

/// Cassandra >= 3.0 and ScyllaDB.
pub static MODERN: QuerySet = QuerySet {
    fetch_keyspaces: "SELECT keyspace_name FROM system_schema.keyspaces;",
    fetch_tables: "SELECT keyspace_name, table_name FROM system_schema.tables; \
                   SELECT keyspace_name, table_name FROM system_schema.columns",
    fetch_columns: "SELECT keyspace_name, table_name, column_name, kind, type \
                    FROM system_schema.columns",
    describe_table: "SELECT * FROM system_schema.tables \
                     WHERE keyspace_name = '{keyspace}' AND table_name = '{table}'",
    fetch_records: "SELECT * FROM {keyspace}.{table} LIMIT {limit}",
    count_records: "SELECT COUNT(*) FROM {keyspace}.{table}",
};

/// Cassandra < 3.0.
pub static LEGACY: QuerySet = QuerySet {
    fetch_keyspaces: "SELECT keyspace_name FROM system.schema_keyspaces;",
    fetch_tables: "SELECT keyspace_name, columnfamily_name AS table_name \
                   FROM system.schema_columnfamilies; \
                   SELECT keyspace_name, columnfamily_name AS table_name \
                   FROM system.schema_columns",
    fetch_columns: "SELECT keyspace_name, columnfamily_name AS table_name, \
                    column_name, type AS kind, validator AS type \
                    FROM system.schema_columns",
    describe_table: "SELECT * FROM system.schema_columnfamilies \
                     WHERE keyspace_name = '{keyspace}' AND columnfamily_name = '{table}'",
    fetch_records: "SELECT * FROM {keyspace}.{table} LIMIT {limit}",
    count_records: "SELECT COUNT(*) FROM {keyspace}.{table}",
};

impl QuerySet {
    /// Returns the raw template for an operation.
    pub fn template(&self, op: Operation) -> &'static str {
        match op {
            Operation::FetchKeyspaces => self.fetch_keyspaces,
            Operation::FetchTables => self.fetch_tables,
            Operation::FetchColumns => self.fetch_columns,
            Operation::DescribeTable => self.describe_table,
            Operation::FetchRecords => self.fetch_records,
            Operation::CountRecords => self.count_records,
        }
    }

    /// Renders an operation's template for a table and optional row limit.
    pub fn render(&self, op: Operation, table: Option<&Table>, limit: Option<u64>) -> String {
        let mut statement = self.template(op).to_string();
        if let Some(table) = table {
            statement = statement
                .replace("{keyspace}", &table.keyspace)
                .replace("{table}", &table.name);
        }
        if let Some(limit) = limit {
            statement = statement.replace("{limit}", &limit.to_string());
        }
        statement
    }
}

/// Which schema layout a connection uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Modern,
    Legacy,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Modern => write!(f, "modern"),
            Self::Legacy => write!(f, "legacy"),
        }
    }
}

/// Dialect chosen for a connection. Fixed for the connection's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialectState {
    /// True when the cluster predates `system_schema`.
    pub is_legacy: bool,
    /// Statements matching the dialect.
    pub queries: &'static QuerySet,
}

impl DialectState {
    /// State for clusters with `system_schema`.
    pub fn modern() -> Self {
        Self {
            is_legacy: false,
            queries: &MODERN,
        }
    }

    /// State for clusters without `system_schema`.
    pub fn legacy() -> Self {
        Self {
            is_legacy: true,
            queries: &LEGACY,
        }
    }

    /// The dialect as an enum.
    pub fn dialect(&self) -> Dialect {
        if self.is_legacy {
            Dialect::Legacy
        } else {
            Dialect::Modern
        }
    }

    /// Normalizes a column type as reported by the catalog.
    pub fn column_type(&self, raw: &str) -> String {
        if self.is_legacy {
            normalize_legacy_type(raw)
        } else {
            raw.to_string()
        }
    }
}

/// Probes the session once and picks the dialect.
///
/// Any probe failure, not just a missing table, selects the legacy dialect.
pub async fn detect(session: &dyn CqlSession) -> DialectState {
    match session.execute(PROBE_QUERY).await {
        Ok(_) => {
            debug!("Cluster exposes system_schema");
            DialectState::modern()
        }
        Err(e) => {
            debug!(error = %e, "Schema probe failed");
            info!("Remote Cassandra database is in legacy mode");
            DialectState::legacy()
        }
    }
}

/// Turns a legacy marshal class name into a readable type.
///
/// Package prefixes and `Type` suffixes are dropped:
/// `org.apache.cassandra.db.marshal.SetType(org.apache.cassandra.db.marshal.UTF8Type)`
/// becomes `Set(UTF8)`.
pub fn normalize_legacy_type(legacy: &str) -> String {
    MARSHAL_NOISE.replace_all(legacy, "").into_owned()
}
