//! Script execution integration tests.
//!
//! Runs multi-statement scripts through the driver and checks what reaches
//! the cluster.

use glance_cql::db::{MockCall, MockSession, Value};
use glance_cql::error::GlanceError;
use glance_cql::query::ExecuteOptions;

use super::mock_driver;

/// Calls made by the script itself, after the dialect probe.
fn script_calls(mock: &MockSession) -> Vec<MockCall> {
    mock.calls().into_iter().skip(1).collect()
}

#[tokio::test]
async fn test_script_runs_in_order() {
    let mock = MockSession::demo();
    let driver = mock_driver(&mock);

    let script = "
        INSERT INTO shop.users (id, name, age) VALUES (4, 'dave', 52);
        SELECT * FROM shop.users;
    ";
    let results = driver
        .run_script(script, &ExecuteOptions::default())
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[1].rows.len(), 3);
    assert_eq!(results[1].rows[0].get("name"), Some(&Value::from("alice")));
    assert_eq!(
        mock.executed()[1..],
        [
            "INSERT INTO shop.users (id, name, age) VALUES (4, 'dave', 52);".to_string(),
            "SELECT * FROM shop.users;".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_semicolon_inside_literal_is_not_split() {
    let mock = MockSession::new();
    let driver = mock_driver(&mock);

    let results = driver
        .run_script(
            "INSERT INTO t (v) VALUES ('a;b');",
            &ExecuteOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(
        script_calls(&mock),
        vec![MockCall::Execute("INSERT INTO t (v) VALUES ('a;b');".to_string())]
    );
}

#[tokio::test]
async fn test_failure_halts_remaining_statements() {
    let mock = MockSession::new().fail_on("FROM s2_fails", "unconfigured table s2_fails");
    let driver = mock_driver(&mock);

    let results = driver
        .run_script(
            "SELECT * FROM s1; SELECT * FROM s2_fails; SELECT * FROM s3;",
            &ExecuteOptions::with_request_id("req-7"),
        )
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert!(!results[0].is_error);
    assert!(results[1].is_error);
    assert!(results.iter().all(|r| r.request_id.as_deref() == Some("req-7")));
    assert_ne!(results[0].result_id, results[1].result_id);

    // s3 never reaches the cluster
    assert_eq!(script_calls(&mock).len(), 2);
    assert!(!mock.executed().iter().any(|s| s.contains("s3")));
}

#[tokio::test]
async fn test_counter_batch_with_timestamp() {
    let mock = MockSession::new();
    let driver = mock_driver(&mock);

    let script = "
        BEGIN COUNTER BATCH USING TIMESTAMP 1700000000000000
          UPDATE stats SET hits = hits + 1 WHERE page = 'home';
          UPDATE stats SET hits = hits + 1 WHERE page = 'about';
        APPLY BATCH;
    ";
    let results = driver
        .run_script(script, &ExecuteOptions::default())
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert!(results[0].query_text.starts_with("BEGIN COUNTER BATCH"));

    let calls = script_calls(&mock);
    let [MockCall::Batch { statements, options }] = calls.as_slice() else {
        panic!("Expected one batch call, got {:?}", calls);
    };
    assert_eq!(statements.len(), 2);
    assert!(options.counter);
    assert!(options.logged);
    assert_eq!(options.timestamp_micros, Some(1_700_000_000_000_000));
}

#[tokio::test]
async fn test_unterminated_batch_is_rejected_before_connecting() {
    let mock = MockSession::new();
    let driver = mock_driver(&mock);

    let err = driver
        .run_script(
            "BEGIN BATCH INSERT INTO t (id) VALUES (1);",
            &ExecuteOptions::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, GlanceError::MalformedBatch(_)));
    assert_eq!(err.category(), "Script Error");
    assert_eq!(mock.connect_count(), 0);
}

#[tokio::test]
async fn test_connection_failure_is_returned() {
    let mock = MockSession::new().with_connect_error("All connection attempts failed");
    let driver = mock_driver(&mock);

    let err = driver
        .run_script("SELECT * FROM t;", &ExecuteOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, GlanceError::Connection(_)));
}
