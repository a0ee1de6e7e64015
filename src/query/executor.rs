//! Script execution against the shared connection.
//!
//! Splits a script into units and dispatches them one at a time, turning
//! each outcome into a `QueryResult`. The first failing unit ends the run.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::connection::ConnectionManager;
use crate::db::QueryResult;
use crate::dialect::DialectState;
use crate::error::{GlanceError, Result};
use crate::query::splitter::{self, ExecutableUnit};

/// Per-call execution options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecuteOptions {
    /// Copied onto every result for caller-side correlation.
    pub request_id: Option<String>,
}

impl ExecuteOptions {
    /// Options carrying a request id.
    pub fn with_request_id(request_id: impl Into<String>) -> Self {
        Self {
            request_id: Some(request_id.into()),
        }
    }
}

/// Runs scripts on the managed connection.
///
/// Cheap to clone; clones share the same connection.
#[derive(Clone)]
pub struct QueryExecutor {
    manager: Arc<ConnectionManager>,
}

impl QueryExecutor {
    /// Creates a new query executor.
    pub fn new(manager: Arc<ConnectionManager>) -> Self {
        Self { manager }
    }

    /// The underlying connection manager.
    pub fn manager(&self) -> &Arc<ConnectionManager> {
        &self.manager
    }

    /// Dialect of the connection, opening it if needed.
    pub async fn dialect(&self) -> Result<DialectState> {
        Ok(self.manager.open().await?.dialect)
    }

    /// Executes every unit of `script` in order.
    ///
    /// Statement failures don't return `Err`: the failing unit yields an
    /// error result and no later unit is sent. `Err` is returned only when
    /// the script can't be split (nothing is sent) or the connection can't
    /// be opened.
    pub async fn execute(&self, script: &str, options: &ExecuteOptions) -> Result<Vec<QueryResult>> {
        let units = splitter::split(script)?;
        let active = self.manager.open().await?;
        let mut results = Vec::with_capacity(units.len());

        for (index, unit) in units.iter().enumerate() {
            debug!(unit = index, query = %unit.text(), "Dispatching");
            let outcome = match unit {
                ExecutableUnit::Simple(statement) => active.session.execute(statement).await,
                ExecutableUnit::Batch(batch) => {
                    active
                        .session
                        .batch(&batch.statements, &batch.options)
                        .await
                }
            };

            match outcome {
                Ok(raw) => results.push(QueryResult::success(
                    active.id.as_str(),
                    unit.text(),
                    raw,
                    options.request_id.clone(),
                )),
                Err(e) => {
                    warn!(unit = index, error = %e, "Statement failed, skipping the rest of the script");
                    results.push(QueryResult::error(
                        active.id.as_str(),
                        unit.text(),
                        e.to_string(),
                        options.request_id.clone(),
                    ));
                    break;
                }
            }
        }

        Ok(results)
    }

    /// Executes a script expected to hold exactly one unit and returns its result.
    pub async fn single_query(&self, statement: &str, options: &ExecuteOptions) -> Result<QueryResult> {
        self.execute(statement, options)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| GlanceError::query("Statement is empty"))
    }
}
