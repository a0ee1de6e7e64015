//! Mock cluster session for testing.
//!
//! Provides an in-memory session that answers statements from a list of
//! rules and records every call it receives.

use super::{BatchOptions, Connector, CqlSession, RawResult, Row, Value};
use crate::config::ConnectionConfig;
use crate::error::{GlanceError, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A call received by the mock.
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    /// A single statement.
    Execute(String),
    /// A batch with its member statements.
    Batch {
        statements: Vec<String>,
        options: BatchOptions,
    },
}

#[derive(Debug, Clone)]
enum Outcome {
    Rows(RawResult),
    Fail(String),
}

#[derive(Debug, Clone)]
struct Rule {
    needle: String,
    outcome: Outcome,
    delay: Option<Duration>,
}

#[derive(Debug, Default)]
struct State {
    rules: Vec<Rule>,
    calls: Vec<MockCall>,
    connect_delay: Option<Duration>,
    connect_error: Option<String>,
    connect_failures: usize,
    shutdowns: usize,
}

/// A mock session that returns predefined results.
///
/// Rules match when the statement contains the rule's text, compared
/// case-insensitively with whitespace collapsed. The first matching rule
/// wins; statements matching no rule succeed with an empty result. Batches
/// fail if any member statement matches a failing rule.
#[derive(Debug, Clone, Default)]
pub struct MockSession {
    state: Arc<Mutex<State>>,
    connects: Arc<AtomicUsize>,
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

impl MockSession {
    /// Creates a mock that answers every statement with an empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers statements containing `needle` with the given rows.
    pub fn on(self, needle: &str, columns: &[&str], rows: Vec<Row>) -> Self {
        let columns = columns.iter().map(|c| c.to_string()).collect();
        self.push_rule(needle, Outcome::Rows(RawResult::with_rows(columns, rows)), None)
    }

    /// Like [`MockSession::on`], but only answers after `delay`.
    pub fn on_delayed(self, needle: &str, columns: &[&str], rows: Vec<Row>, delay: Duration) -> Self {
        let columns = columns.iter().map(|c| c.to_string()).collect();
        self.push_rule(
            needle,
            Outcome::Rows(RawResult::with_rows(columns, rows)),
            Some(delay),
        )
    }

    /// Fails statements containing `needle` with the given message.
    pub fn fail_on(self, needle: &str, message: &str) -> Self {
        self.push_rule(needle, Outcome::Fail(message.to_string()), None)
    }

    /// Delays every connection attempt.
    pub fn with_connect_delay(self, delay: Duration) -> Self {
        self.lock().connect_delay = Some(delay);
        self
    }

    /// Makes every connection attempt fail.
    pub fn with_connect_error(self, message: &str) -> Self {
        self.lock().connect_error = Some(message.to_string());
        self
    }

    /// Makes the next `n` connection attempts fail, then connects normally.
    pub fn with_connect_failures(self, n: usize) -> Self {
        self.lock().connect_failures = n;
        self
    }

    fn push_rule(self, needle: &str, outcome: Outcome, delay: Option<Duration>) -> Self {
        self.lock().rules.push(Rule {
            needle: normalize(needle),
            outcome,
            delay,
        });
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        // A poisoned lock only means another test thread panicked mid-call.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn find_rule(&self, statement: &str) -> Option<Rule> {
        let statement = normalize(statement);
        self.lock()
            .rules
            .iter()
            .find(|rule| statement.contains(&rule.needle))
            .cloned()
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }

    /// Single statements received so far, in order.
    pub fn executed(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                MockCall::Execute(statement) => Some(statement),
                MockCall::Batch { .. } => None,
            })
            .collect()
    }

    /// Number of single statements and batches received.
    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    /// Number of successful connection attempts.
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Number of shutdown calls.
    pub fn shutdown_count(&self) -> usize {
        self.lock().shutdowns
    }

    /// A mock preloaded with a small modern-dialect schema and data set.
    pub fn demo() -> Self {
        fn text(s: &str) -> Value {
            Value::String(s.to_string())
        }
        fn row(pairs: &[(&str, Value)]) -> Row {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect()
        }

        let users: Vec<Row> = [("alice", 31), ("bob", 27), ("carol", 45)]
            .iter()
            .enumerate()
            .map(|(i, (name, age))| {
                row(&[
                    ("id", Value::Int(i as i64 + 1)),
                    ("name", text(*name)),
                    ("age", Value::Int(i64::from(*age))),
                ])
            })
            .collect();

        Self::new()
            .on(
                "FROM system_schema.keyspaces",
                &["keyspace_name"],
                vec![
                    row(&[("keyspace_name", text("shop"))]),
                    row(&[("keyspace_name", text("system"))]),
                ],
            )
            .on(
                "FROM system_schema.tables",
                &["keyspace_name", "table_name"],
                vec![
                    row(&[("keyspace_name", text("shop")), ("table_name", text("users"))]),
                    row(&[("keyspace_name", text("system")), ("table_name", text("local"))]),
                ],
            )
            .on(
                "FROM system_schema.columns",
                &["keyspace_name", "table_name", "column_name", "kind", "type"],
                vec![
                    row(&[
                        ("keyspace_name", text("shop")),
                        ("table_name", text("users")),
                        ("column_name", text("id")),
                        ("kind", text("partition_key")),
                        ("type", text("int")),
                    ]),
                    row(&[
                        ("keyspace_name", text("shop")),
                        ("table_name", text("users")),
                        ("column_name", text("name")),
                        ("kind", text("regular")),
                        ("type", text("text")),
                    ]),
                    row(&[
                        ("keyspace_name", text("shop")),
                        ("table_name", text("users")),
                        ("column_name", text("age")),
                        ("kind", text("regular")),
                        ("type", text("int")),
                    ]),
                ],
            )
            .on(
                "SELECT COUNT(*) FROM shop.users",
                &["count"],
                vec![row(&[("count", Value::Int(users.len() as i64))])],
            )
            .on("FROM shop.users", &["id", "name", "age"], users)
            .on(
                "FROM system.local",
                &["system.now()"],
                vec![row(&[("system.now()", text("6a1b2c3d-0000-1000-8000-000000000000"))])],
            )
    }
}

#[async_trait]
impl CqlSession for MockSession {
    async fn execute(&self, statement: &str) -> Result<RawResult> {
        self.lock().calls.push(MockCall::Execute(statement.to_string()));

        let Some(rule) = self.find_rule(statement) else {
            return Ok(RawResult::empty());
        };
        if let Some(delay) = rule.delay {
            tokio::time::sleep(delay).await;
        }
        match rule.outcome {
            Outcome::Rows(raw) => Ok(raw),
            Outcome::Fail(message) => Err(GlanceError::query(message)),
        }
    }

    async fn batch(&self, statements: &[String], options: &BatchOptions) -> Result<RawResult> {
        self.lock().calls.push(MockCall::Batch {
            statements: statements.to_vec(),
            options: *options,
        });

        for statement in statements {
            if let Some(Rule {
                outcome: Outcome::Fail(message),
                ..
            }) = self.find_rule(statement)
            {
                return Err(GlanceError::query(message));
            }
        }
        Ok(RawResult::empty())
    }

    async fn shutdown(&self) -> Result<()> {
        self.lock().shutdowns += 1;
        Ok(())
    }
}

#[async_trait]
impl Connector for MockSession {
    async fn connect(&self, _config: &ConnectionConfig) -> Result<Arc<dyn CqlSession>> {
        let (delay, error) = {
            let mut state = self.lock();
            let error = match state.connect_error.clone() {
                Some(message) => Some(message),
                None if state.connect_failures > 0 => {
                    state.connect_failures -= 1;
                    Some("connection refused".to_string())
                }
                None => None,
            };
            (state.connect_delay, error)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = error {
            return Err(GlanceError::connection(message));
        }
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(self.clone()))
    }
}
