//! The driver facade callers talk to.
//!
//! Bundles one connection with the executor, catalog and record fetcher
//! that share it.

use std::sync::Arc;

use tracing::info;

use crate::catalog::{CatalogEntry, Column, ExplorerNode, Keyspace, SchemaCatalog, Table, TableFilter};
use crate::config::{ConnectionConfig, QueryConfig};
use crate::connection::ConnectionManager;
use crate::db::{Connector, QueryResult};
use crate::dialect::DialectState;
use crate::error::{GlanceError, Result};
use crate::query::{ExecuteOptions, PageRequest, QueryExecutor, RecordFetcher};

/// Statement used to check that a connection works.
pub const TEST_QUERY: &str = "SELECT now() FROM system.local";

/// One configured target and everything that runs on it.
pub struct CqlDriver {
    manager: Arc<ConnectionManager>,
    executor: QueryExecutor,
    catalog: SchemaCatalog,
    records: RecordFetcher,
}

impl CqlDriver {
    /// Creates a driver. The connection is opened on first use.
    pub fn new(config: ConnectionConfig, connector: Arc<dyn Connector>, query: &QueryConfig) -> Self {
        Self::from_manager(ConnectionManager::new(config, connector), query)
    }

    /// Creates a driver around a prepared manager.
    pub fn from_manager(manager: ConnectionManager, query: &QueryConfig) -> Self {
        let manager = Arc::new(manager);
        let executor = QueryExecutor::new(Arc::clone(&manager));
        Self {
            catalog: SchemaCatalog::new(executor.clone()),
            records: RecordFetcher::new(executor.clone(), query),
            executor,
            manager,
        }
    }

    /// Connection id reported on results.
    pub fn connection_id(&self) -> &str {
        self.manager.id()
    }

    /// Runs a script and returns one result per executed unit.
    pub async fn run_script(&self, script: &str, options: &ExecuteOptions) -> Result<Vec<QueryResult>> {
        self.executor.execute(script, options).await
    }

    /// Opens the connection and checks it answers a trivial query.
    pub async fn test_connection(&self) -> Result<DialectState> {
        let result = self
            .executor
            .single_query(TEST_QUERY, &ExecuteOptions::default())
            .await?;
        if result.is_error {
            return Err(GlanceError::connection(result.messages.join("; ")));
        }
        let dialect = self.executor.dialect().await?;
        info!(connection = %self.connection_id(), dialect = %dialect.dialect(), "Connection test passed");
        Ok(dialect)
    }

    /// All keyspaces.
    pub async fn list_keyspaces(&self) -> Result<Vec<Keyspace>> {
        self.catalog.list_keyspaces().await
    }

    /// Tables, optionally of one keyspace.
    pub async fn list_tables(&self, parent: Option<&Keyspace>) -> Result<Vec<Table>> {
        self.catalog.list_tables(parent).await
    }

    /// Columns, optionally of one table.
    pub async fn list_columns(&self, parent: Option<&Table>) -> Result<Vec<Column>> {
        self.catalog.list_columns(parent).await
    }

    pub async fn describe_table(&self, table: &Table, options: &ExecuteOptions) -> Result<Vec<QueryResult>> {
        self.catalog.describe_table(table, options).await
    }

    pub async fn children_for(&self, node: &ExplorerNode) -> Result<Vec<CatalogEntry>> {
        self.catalog.children_for(node).await
    }

    pub async fn search_tables(&self) -> Result<Vec<Table>> {
        self.catalog.search_tables().await
    }

    pub async fn search_columns(&self, tables: &[TableFilter]) -> Result<Vec<Column>> {
        self.catalog.search_columns(tables).await
    }

    /// One page of a table with pagination attached.
    pub async fn show_records(
        &self,
        table: &Table,
        request: PageRequest,
        options: &ExecuteOptions,
    ) -> Result<Vec<QueryResult>> {
        self.records.show_records(table, request, options).await
    }

    /// Shuts the connection down.
    pub async fn close(&self) -> Result<()> {
        self.manager.close().await
    }
}
