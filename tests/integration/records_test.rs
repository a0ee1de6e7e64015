//! Record preview integration tests.

use std::time::{Duration, Instant};

use glance_cql::catalog::Table;
use glance_cql::config::QueryConfig;
use glance_cql::db::{MockSession, Row, Value};
use glance_cql::query::{ExecuteOptions, PageRequest};

use super::{mock_driver, mock_driver_with};

fn events(n: i64) -> Vec<Row> {
    (0..n)
        .map(|i| {
            Row::from([
                ("id".to_string(), Value::Int(i)),
                ("kind".to_string(), Value::from("click")),
            ])
        })
        .collect()
}

fn count(n: i64) -> Vec<Row> {
    vec![Row::from([("count".to_string(), Value::Int(n))])]
}

#[tokio::test]
async fn test_preview_first_page_of_demo_table() {
    let mock = MockSession::demo();
    let driver = mock_driver(&mock);

    let results = driver
        .show_records(
            &Table::new("shop", "users"),
            PageRequest { limit: 2, page: None },
            &ExecuteOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    let pagination = results[0].pagination.as_ref().unwrap();
    assert_eq!(pagination.total, 3);
    assert_eq!(pagination.page, 0);
    assert_eq!(pagination.page_size, 2);
    assert!(mock
        .executed()
        .contains(&"SELECT * FROM shop.users LIMIT 2;".to_string()));
}

#[tokio::test]
async fn test_preview_discards_earlier_pages() {
    let mock = MockSession::new()
        .on("SELECT COUNT(*) FROM app.events", &["count"], count(25))
        .on("FROM app.events LIMIT 30", &["id", "kind"], events(25));
    let driver = mock_driver(&mock);

    let results = driver
        .show_records(
            &Table::new("app", "events"),
            PageRequest { limit: 10, page: Some(2) },
            &ExecuteOptions::default(),
        )
        .await
        .unwrap();

    let result = &results[0];
    assert_eq!(result.rows.len(), 5);
    assert_eq!(result.rows[0].get("id"), Some(&Value::Int(20)));
    assert_eq!(result.messages, vec!["Query ok with 5 result(s)".to_string()]);

    let pagination = result.pagination.as_ref().unwrap();
    assert_eq!(pagination.total, 25);
    assert_eq!(pagination.page, 2);
    assert_eq!(pagination.query_params, Table::new("app", "events"));
}

#[tokio::test]
async fn test_slow_count_does_not_block_preview() {
    let mock = MockSession::new()
        .on_delayed(
            "SELECT COUNT(*) FROM app.huge",
            &["count"],
            count(90_000_000),
            Duration::from_secs(30),
        )
        .on("FROM app.huge LIMIT", &["id", "kind"], events(10));
    let driver = mock_driver_with(
        &mock,
        QueryConfig {
            count_timeout_ms: 50,
            fallback_total: 5000,
        },
    );

    let started = Instant::now();
    let results = driver
        .show_records(
            &Table::new("app", "huge"),
            PageRequest { limit: 10, page: None },
            &ExecuteOptions::default(),
        )
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(results[0].rows.len(), 10);
    assert_eq!(results[0].pagination.as_ref().unwrap().total, 5000);
}

#[tokio::test]
async fn test_count_arriving_within_timeout_is_used() {
    let mock = MockSession::new()
        .on_delayed(
            "SELECT COUNT(*) FROM app.events",
            &["count"],
            count(42),
            Duration::from_millis(20),
        )
        .on("FROM app.events LIMIT", &["id", "kind"], events(5));
    let driver = mock_driver_with(
        &mock,
        QueryConfig {
            count_timeout_ms: 5_000,
            fallback_total: 5000,
        },
    );

    let results = driver
        .show_records(
            &Table::new("app", "events"),
            PageRequest { limit: 5, page: None },
            &ExecuteOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(results[0].pagination.as_ref().unwrap().total, 42);
}
