//! Paged record previews.
//!
//! A preview runs the row fetch and a `COUNT(*)` side by side. The count
//! gets a short grace period after the fetch completes; when it misses it,
//! or fails, the total falls back to a fixed upper bound.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::catalog::Table;
use crate::config::QueryConfig;
use crate::db::{Pagination, QueryResult};
use crate::dialect::Operation;
use crate::error::Result;
use crate::query::executor::{ExecuteOptions, QueryExecutor};

/// Which slice of a table to preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Rows per page.
    pub limit: u64,
    /// Zero-based page; `None` means the first page.
    pub page: Option<u64>,
}

impl PageRequest {
    /// Number of rows to skip.
    pub fn offset(&self) -> u64 {
        self.limit.saturating_mul(self.page.unwrap_or(0))
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: 50,
            page: None,
        }
    }
}

/// Fetches table pages with an approximate total.
#[derive(Clone)]
pub struct RecordFetcher {
    executor: QueryExecutor,
    count_timeout: Duration,
    fallback_total: u64,
}

impl RecordFetcher {
    /// Creates a fetcher using the configured count timeout and fallback.
    pub fn new(executor: QueryExecutor, config: &QueryConfig) -> Self {
        Self {
            executor,
            count_timeout: config.count_timeout(),
            fallback_total: config.fallback_total,
        }
    }

    /// Returns one page of `table` with pagination attached.
    ///
    /// CQL has no OFFSET, so the fetch asks for `offset + limit` rows and the
    /// leading `offset` rows are discarded here.
    pub async fn show_records(
        &self,
        table: &Table,
        request: PageRequest,
        options: &ExecuteOptions,
    ) -> Result<Vec<QueryResult>> {
        let dialect = self.executor.dialect().await?;
        let offset = request.offset();
        let fetch_limit = offset.saturating_add(request.limit);

        let count_statement = dialect
            .queries
            .render(Operation::CountRecords, Some(table), None);
        let fetch_statement = dialect
            .queries
            .render(Operation::FetchRecords, Some(table), Some(fetch_limit));

        let count_task = self.spawn_count(count_statement, options);

        let mut result = self.executor.single_query(&fetch_statement, options).await?;

        // The count only gets the grace period once the fetch is back.
        // Dropping the handle on timeout leaves the task to finish unobserved.
        let total = match tokio::time::timeout(self.count_timeout, count_task).await {
            Ok(Ok(Ok(count))) => match count_from_result(&count) {
                Some(total) => total,
                None => {
                    warn!(table = %table, "Count result was not usable, using fallback total");
                    self.fallback_total
                }
            },
            Ok(Ok(Err(e))) => {
                warn!(table = %table, error = %e, "Count failed, using fallback total");
                self.fallback_total
            }
            Ok(Err(e)) => {
                warn!(table = %table, error = %e, "Count task aborted, using fallback total");
                self.fallback_total
            }
            Err(_) => {
                debug!(
                    table = %table,
                    timeout_ms = self.count_timeout.as_millis() as u64,
                    "Count is slow, using fallback total"
                );
                self.fallback_total
            }
        };

        if !result.is_error {
            let skip = usize::try_from(offset).unwrap_or(usize::MAX);
            result.rows = result.rows.into_iter().skip(skip).collect();
            result.messages = vec![format!("Query ok with {} result(s)", result.rows.len())];
        }

        result.pagination = Some(Pagination {
            total,
            page: request.page.unwrap_or(0),
            page_size: request.limit,
            base_query_text: dialect.queries.template(Operation::FetchRecords).to_string(),
            query_params: table.clone(),
        });

        Ok(vec![result])
    }

    /// Runs the count on its own task, tagged with the caller's request id.
    fn spawn_count(
        &self,
        statement: String,
        options: &ExecuteOptions,
    ) -> JoinHandle<Result<QueryResult>> {
        let counter = self.executor.clone();
        let options = options.clone();
        tokio::spawn(async move { counter.single_query(&statement, &options).await })
    }
}

/// Reads the first column of the first row as a non-negative count.
fn count_from_result(result: &QueryResult) -> Option<u64> {
    if result.is_error {
        return None;
    }
    let row = result.rows.first()?;
    let value = result
        .columns
        .first()
        .and_then(|name| row.get(name))
        .or_else(|| row.values().next())?;
    value.as_i64().and_then(|n| u64::try_from(n).ok())
}
