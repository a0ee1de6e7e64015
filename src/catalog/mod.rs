//! Schema catalog for glance-cql.
//!
//! Lists keyspaces, tables and columns using the statements of the
//! connection's dialect. Listings are recomputed on every call.

pub mod entries;

pub use entries::{CatalogEntry, Column, ExplorerNode, Keyspace, Table, TableFilter};

use std::collections::HashMap;

use tracing::warn;

use crate::db::{QueryResult, Row};
use crate::dialect::{DialectState, Operation};
use crate::error::Result;
use crate::query::{ExecuteOptions, QueryExecutor};

/// Reads schema metadata through the query executor.
#[derive(Clone)]
pub struct SchemaCatalog {
    executor: QueryExecutor,
}

fn text<'a>(row: &'a Row, column: &str) -> Option<&'a str> {
    row.get(column).and_then(|v| v.as_str())
}

/// Rows of the first result set, or none when it failed.
fn first_rows(results: Vec<QueryResult>, what: &str) -> Vec<Row> {
    match results.into_iter().next() {
        Some(result) if result.is_error => {
            warn!(listing = what, messages = ?result.messages, "Catalog query failed");
            Vec::new()
        }
        Some(result) => result.rows,
        None => Vec::new(),
    }
}

impl SchemaCatalog {
    /// Creates a catalog on top of an executor.
    pub fn new(executor: QueryExecutor) -> Self {
        Self { executor }
    }

    async fn run(&self, op: Operation, table: Option<&Table>) -> Result<(DialectState, Vec<QueryResult>)> {
        let dialect = self.executor.dialect().await?;
        let statement = dialect.queries.render(op, table, None);
        let results = self
            .executor
            .execute(&statement, &ExecuteOptions::default())
            .await?;
        Ok((dialect, results))
    }

    /// All keyspaces, in the order the cluster reports them.
    pub async fn list_keyspaces(&self) -> Result<Vec<Keyspace>> {
        let (_, results) = self.run(Operation::FetchKeyspaces, None).await?;
        Ok(first_rows(results, "keyspaces")
            .iter()
            .filter_map(|row| text(row, "keyspace_name").map(Keyspace::new))
            .collect())
    }

    /// Tables of `parent`, or of every keyspace.
    ///
    /// The table listing is a compound fetch; only its first result set
    /// names tables.
    pub async fn list_tables(&self, parent: Option<&Keyspace>) -> Result<Vec<Table>> {
        let (_, results) = self.run(Operation::FetchTables, None).await?;
        Ok(first_rows(results, "tables")
            .iter()
            .filter_map(|row| {
                let keyspace = text(row, "keyspace_name")?;
                let name = text(row, "table_name")?;
                Some(Table::new(keyspace, name))
            })
            .filter(|table| parent.map_or(true, |ks| table.keyspace == ks.name))
            .collect())
    }

    /// Columns of `parent`, or of every table.
    ///
    /// Filtering compares the table name only, so same-named tables in
    /// other keyspaces are included.
    pub async fn list_columns(&self, parent: Option<&Table>) -> Result<Vec<Column>> {
        let (dialect, results) = self.run(Operation::FetchColumns, None).await?;
        Ok(first_rows(results, "columns")
            .iter()
            .filter_map(|row| column_from_row(row, &dialect))
            .filter(|column| parent.map_or(true, |t| column.table == t.name))
            .collect())
    }

    /// Raw metadata row(s) describing `table`.
    pub async fn describe_table(&self, table: &Table, options: &ExecuteOptions) -> Result<Vec<QueryResult>> {
        let dialect = self.executor.dialect().await?;
        let statement = dialect
            .queries
            .render(Operation::DescribeTable, Some(table), None);
        self.executor.execute(&statement, options).await
    }

    /// Children of an explorer node.
    pub async fn children_for(&self, node: &ExplorerNode) -> Result<Vec<CatalogEntry>> {
        Ok(match node {
            ExplorerNode::Connection => self
                .list_keyspaces()
                .await?
                .into_iter()
                .map(CatalogEntry::Keyspace)
                .collect(),
            ExplorerNode::Keyspace(keyspace) => self
                .list_tables(Some(keyspace))
                .await?
                .into_iter()
                .map(CatalogEntry::Table)
                .collect(),
            ExplorerNode::Table(table) => self
                .list_columns(Some(table))
                .await?
                .into_iter()
                .map(CatalogEntry::Column)
                .collect(),
            ExplorerNode::Column(_) => Vec::new(),
        })
    }

    /// Every table of every keyspace.
    pub async fn search_tables(&self) -> Result<Vec<Table>> {
        self.list_tables(None).await
    }

    /// Columns for completion, one per column name.
    ///
    /// With filters, only columns of a matching table are considered. When
    /// several columns share a name the last one wins, at the position the
    /// name was first seen.
    pub async fn search_columns(&self, tables: &[TableFilter]) -> Result<Vec<Column>> {
        let columns = self.list_columns(None).await?;
        let mut unique: Vec<Column> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for column in columns
            .into_iter()
            .filter(|c| tables.is_empty() || tables.iter().any(|f| f.matches(c)))
        {
            match positions.get(&column.name) {
                Some(&i) => unique[i] = column,
                None => {
                    positions.insert(column.name.clone(), unique.len());
                    unique.push(column);
                }
            }
        }
        Ok(unique)
    }
}

fn column_from_row(row: &Row, dialect: &DialectState) -> Option<Column> {
    let kind = text(row, "kind").unwrap_or("regular");
    Some(Column {
        name: text(row, "column_name")?.to_string(),
        keyspace: text(row, "keyspace_name")?.to_string(),
        table: text(row, "table_name")?.to_string(),
        data_type: dialect.column_type(text(row, "type").unwrap_or_default()),
        is_partition_key: kind == "partition_key",
        is_primary_key: kind != "regular",
        is_nullable: kind == "regular",
    })
}
