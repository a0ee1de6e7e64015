//! Cassandra / ScyllaDB client implementation.
//!
//! Provides `ScyllaSession`, which implements the `CqlSession` trait on top
//! of the `scylla` driver, and `ScyllaConnector`, which opens it.

use crate::config::{ConnectionConfig, LoadBalancing};
use crate::db::{BatchOptions, Connector, CqlSession, RawResult, Row, Value};
use crate::error::{GlanceError, Result};
use async_trait::async_trait;
use scylla::batch::{Batch, BatchType};
use scylla::frame::response::result::CqlValue;
use scylla::load_balancing::DefaultPolicy;
use scylla::{ExecutionProfile, Session, SessionBuilder};
use std::sync::Arc;
use tracing::{debug, info};

/// Opens sessions with the `scylla` driver.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScyllaConnector;

#[async_trait]
impl Connector for ScyllaConnector {
    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn CqlSession>> {
        let session = ScyllaSession::connect(config).await?;
        Ok(Arc::new(session))
    }
}

/// A session backed by the `scylla` driver.
pub struct ScyllaSession {
    session: Session,
}

impl ScyllaSession {
    /// Connects to the cluster described by `config`.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let endpoints = config.endpoints();
        info!(endpoints = %endpoints.join(","), "Connecting to cluster");

        let policy = DefaultPolicy::builder()
            .token_aware(config.load_balancing == LoadBalancing::TokenAware)
            .build();
        let profile = ExecutionProfile::builder()
            .load_balancing_policy(policy)
            .build();

        let mut builder = SessionBuilder::new()
            .connection_timeout(config.connect_timeout())
            .default_execution_profile_handle(profile.into_handle());
        for endpoint in &endpoints {
            builder = builder.known_node(endpoint);
        }
        if let Some(user) = &config.user {
            builder = builder.user(user, config.password.as_deref().unwrap_or_default());
        }
        if let Some(keyspace) = &config.keyspace {
            builder = builder.use_keyspace(keyspace, false);
        }
        if !config.options.is_empty() {
            debug!(options = ?config.options, "Ignoring driver options not understood by scylla");
        }

        let session = builder
            .build()
            .await
            .map_err(|e| GlanceError::connection(format!("Cannot connect to {}: {e}", endpoints.join(","))))?;

        debug!("Successfully connected to cluster");
        Ok(Self { session })
    }
}

#[async_trait]
impl CqlSession for ScyllaSession {
    async fn execute(&self, statement: &str) -> Result<RawResult> {
        let result = self
            .session
            .query_unpaged(statement, ())
            .await
            .map_err(|e| GlanceError::query(e.to_string()))?;

        let columns: Vec<String> = result.col_specs().iter().map(|s| s.name.clone()).collect();
        let rows = result
            .rows_or_empty()
            .into_iter()
            .map(|row| convert_row(&columns, row.columns))
            .collect();

        Ok(RawResult::with_rows(columns, rows))
    }

    async fn batch(&self, statements: &[String], options: &BatchOptions) -> Result<RawResult> {
        let batch_type = if options.counter {
            BatchType::Counter
        } else if options.logged {
            BatchType::Logged
        } else {
            BatchType::Unlogged
        };

        let mut batch = Batch::new(batch_type);
        for statement in statements {
            batch.append_statement(statement.as_str());
        }
        if options.timestamp_micros.is_some() {
            batch.set_timestamp(options.timestamp_micros);
        }

        let values = vec![(); statements.len()];
        let result = self
            .session
            .batch(&batch, values)
            .await
            .map_err(|e| GlanceError::query(e.to_string()))?;

        let columns: Vec<String> = result.col_specs().iter().map(|s| s.name.clone()).collect();
        let rows = result
            .rows_or_empty()
            .into_iter()
            .map(|row| convert_row(&columns, row.columns))
            .collect();

        Ok(RawResult::with_rows(columns, rows))
    }

    async fn shutdown(&self) -> Result<()> {
        // The driver closes its pools when the session is dropped.
        debug!("Session shutdown requested");
        Ok(())
    }
}

fn convert_row(columns: &[String], values: Vec<Option<CqlValue>>) -> Row {
    columns
        .iter()
        .cloned()
        .zip(values)
        .map(|(name, value)| (name, value.as_ref().map(convert_value).unwrap_or_default()))
        .collect()
}

fn convert_value(value: &CqlValue) -> Value {
    match value {
        CqlValue::Empty => Value::Null,
        CqlValue::Boolean(b) => Value::Bool(*b),
        CqlValue::TinyInt(i) => Value::Int(i64::from(*i)),
        CqlValue::SmallInt(i) => Value::Int(i64::from(*i)),
        CqlValue::Int(i) => Value::Int(i64::from(*i)),
        CqlValue::BigInt(i) => Value::Int(*i),
        CqlValue::Counter(c) => Value::Int(c.0),
        CqlValue::Float(f) => Value::Float(f64::from(*f)),
        CqlValue::Double(f) => Value::Float(*f),
        CqlValue::Ascii(s) | CqlValue::Text(s) => Value::String(s.clone()),
        CqlValue::Uuid(u) => Value::String(u.to_string()),
        CqlValue::Timeuuid(u) => Value::String(u.to_string()),
        CqlValue::Inet(addr) => Value::String(addr.to_string()),
        CqlValue::Blob(bytes) => Value::Bytes(bytes.clone()),
        CqlValue::List(items) | CqlValue::Set(items) => {
            Value::List(items.iter().map(convert_value).collect())
        }
        CqlValue::Map(entries) => Value::Map(
            entries
                .iter()
                .map(|(k, v)| (convert_value(k), convert_value(v)))
                .collect(),
        ),
        CqlValue::Tuple(items) => Value::List(
            items
                .iter()
                .map(|item| item.as_ref().map(convert_value).unwrap_or_default())
                .collect(),
        ),
        other => Value::String(format!("{other:?}")),
    }
}
