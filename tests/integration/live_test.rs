//! Tests against a live cluster.
//!
//! Skipped unless CQL_URL is set.

use std::sync::Arc;

use glance_cql::catalog::{Keyspace, Table};
use glance_cql::config::{ConnectionConfig, QueryConfig};
use glance_cql::db::ScyllaConnector;
use glance_cql::driver::CqlDriver;
use glance_cql::query::{ExecuteOptions, PageRequest};

/// Helper to get the test cluster URL from environment.
fn get_test_cluster_url() -> Option<String> {
    std::env::var("CQL_URL").ok()
}

/// Helper to create a driver for the live cluster.
fn get_test_driver() -> Option<CqlDriver> {
    let url = get_test_cluster_url()?;
    let config = ConnectionConfig::from_connection_string(&url).ok()?;
    Some(CqlDriver::new(
        config,
        Arc::new(ScyllaConnector),
        &QueryConfig::default(),
    ))
}

#[tokio::test]
async fn test_live_connection() {
    let Some(driver) = get_test_driver() else {
        eprintln!("Skipping test: CQL_URL not set");
        return;
    };

    let dialect = driver.test_connection().await.unwrap();
    assert!(!dialect.is_legacy, "test clusters are expected to expose system_schema");
    driver.close().await.unwrap();
}

#[tokio::test]
async fn test_live_script_and_preview() {
    let Some(driver) = get_test_driver() else {
        eprintln!("Skipping test: CQL_URL not set");
        return;
    };

    let script = "
        CREATE KEYSPACE IF NOT EXISTS glance_cql_test
          WITH replication = {'class': 'SimpleStrategy', 'replication_factor': 1};
        CREATE TABLE IF NOT EXISTS glance_cql_test.notes (id int PRIMARY KEY, body text);
        BEGIN BATCH
          INSERT INTO glance_cql_test.notes (id, body) VALUES (1, 'first; with a semicolon');
          INSERT INTO glance_cql_test.notes (id, body) VALUES (2, 'second');
        APPLY BATCH;
    ";
    let results = driver
        .run_script(script, &ExecuteOptions::default())
        .await
        .unwrap();
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| !r.is_error), "{:?}", results);

    let table = Table::new("glance_cql_test", "notes");
    let preview = driver
        .show_records(
            &table,
            PageRequest { limit: 1, page: Some(1) },
            &ExecuteOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(preview[0].rows.len(), 1);
    assert_eq!(preview[0].pagination.as_ref().unwrap().total, 2);

    let tables = driver
        .list_tables(Some(&Keyspace::new("glance_cql_test")))
        .await
        .unwrap();
    assert!(tables.contains(&table));

    let columns = driver.list_columns(Some(&table)).await.unwrap();
    let id = columns.iter().find(|c| c.name == "id").unwrap();
    assert!(id.is_partition_key);
    assert_eq!(id.data_type, "int");

    driver.close().await.unwrap();
}
