//! Cluster access layer for glance-cql.
//!
//! Provides a trait-based interface over the CQL wire client, allowing the
//! real driver and the in-memory mock to be used interchangeably.

mod cluster;
mod mock;
mod types;

pub use cluster::{ScyllaConnector, ScyllaSession};
pub use mock::{MockCall, MockSession};
pub use types::{Pagination, QueryResult, RawResult, Row, Value};

use crate::config::ConnectionConfig;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// How a multi-statement batch is applied by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Counter batch (only counter updates allowed).
    pub counter: bool,
    /// Logged batches go through the batch log; unlogged ones don't.
    pub logged: bool,
    /// Write timestamp applied to every member statement.
    pub timestamp_micros: Option<i64>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            counter: false,
            logged: true,
            timestamp_micros: None,
        }
    }
}

/// An open session against a cluster.
///
/// All operations are async and return Results with GlanceError.
#[async_trait]
pub trait CqlSession: Send + Sync {
    /// Executes a single statement and returns its rows.
    async fn execute(&self, statement: &str) -> Result<RawResult>;

    /// Applies the statements as one atomic batch.
    async fn batch(&self, statements: &[String], options: &BatchOptions) -> Result<RawResult>;

    /// Closes the session.
    async fn shutdown(&self) -> Result<()>;
}

/// Opens sessions for a connection configuration.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connects to the cluster described by `config`.
    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn CqlSession>>;
}
