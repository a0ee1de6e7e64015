//! Schema catalog integration tests.
//!
//! Covers both schema dialects and explorer navigation.

use glance_cql::catalog::{CatalogEntry, ExplorerNode, Keyspace, Table, TableFilter};
use glance_cql::db::{MockSession, Row, Value};
use glance_cql::query::ExecuteOptions;

use super::mock_driver;

fn row(pairs: &[(&str, &str)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), Value::from(*v)))
        .collect()
}

/// A cluster without `system_schema`.
fn legacy_cluster() -> MockSession {
    MockSession::new()
        .fail_on("system_schema", "unconfigured table schema_keyspaces")
        .on(
            "FROM system.schema_columnfamilies",
            &["keyspace_name", "table_name"],
            vec![
                row(&[("keyspace_name", "metrics"), ("table_name", "samples")]),
                row(&[("keyspace_name", "system"), ("table_name", "local")]),
            ],
        )
        .on(
            "FROM system.schema_columns",
            &["keyspace_name", "table_name", "column_name", "kind", "type"],
            vec![
                row(&[
                    ("keyspace_name", "metrics"),
                    ("table_name", "samples"),
                    ("column_name", "series"),
                    ("kind", "partition_key"),
                    ("type", "org.apache.cassandra.db.marshal.UTF8Type"),
                ]),
                row(&[
                    ("keyspace_name", "metrics"),
                    ("table_name", "samples"),
                    ("column_name", "ts"),
                    ("kind", "clustering_key"),
                    ("type", "org.apache.cassandra.db.marshal.TimestampType"),
                ]),
                row(&[
                    ("keyspace_name", "metrics"),
                    ("table_name", "samples"),
                    ("column_name", "labels"),
                    ("kind", "regular"),
                    (
                        "type",
                        "org.apache.cassandra.db.marshal.SetType(org.apache.cassandra.db.marshal.UTF8Type)",
                    ),
                ]),
            ],
        )
}

#[tokio::test]
async fn test_modern_cluster_browse() {
    let mock = MockSession::demo();
    let driver = mock_driver(&mock);

    let keyspaces = driver.children_for(&ExplorerNode::Connection).await.unwrap();
    assert_eq!(
        keyspaces,
        vec![
            CatalogEntry::Keyspace(Keyspace::new("shop")),
            CatalogEntry::Keyspace(Keyspace::new("system")),
        ]
    );

    let tables = driver
        .children_for(&ExplorerNode::Keyspace(Keyspace::new("shop")))
        .await
        .unwrap();
    assert_eq!(tables, vec![CatalogEntry::Table(Table::new("shop", "users"))]);

    let columns = driver
        .list_columns(Some(&Table::new("shop", "users")))
        .await
        .unwrap();
    let names: Vec<_> = columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["id", "name", "age"]);
    assert_eq!(columns[2].data_type, "int");

    assert!(mock
        .executed()
        .iter()
        .all(|s| !s.contains("system.schema_")));
}

#[tokio::test]
async fn test_legacy_cluster_browse() {
    let mock = legacy_cluster();
    let driver = mock_driver(&mock);

    let tables = driver
        .list_tables(Some(&Keyspace::new("metrics")))
        .await
        .unwrap();
    assert_eq!(tables, vec![Table::new("metrics", "samples")]);

    let columns = driver
        .list_columns(Some(&Table::new("metrics", "samples")))
        .await
        .unwrap();
    assert_eq!(columns.len(), 3);

    assert_eq!(columns[0].data_type, "UTF8");
    assert!(columns[0].is_partition_key);
    assert!(!columns[0].is_nullable);

    assert_eq!(columns[1].data_type, "Timestamp");
    assert!(!columns[1].is_partition_key);
    assert!(columns[1].is_primary_key);
    assert!(!columns[1].is_nullable);

    assert_eq!(columns[2].data_type, "Set(UTF8)");
    assert!(columns[2].is_nullable);
    assert!(!columns[2].is_primary_key);

    // The probe is the only statement against system_schema
    let executed = mock.executed();
    assert_eq!(executed.iter().filter(|s| s.contains("system_schema")).count(), 1);
}

#[tokio::test]
async fn test_describe_table() {
    let mock = MockSession::demo();
    let driver = mock_driver(&mock);

    let results = driver
        .describe_table(&Table::new("shop", "users"), &ExecuteOptions::with_request_id("d1"))
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert!(!results[0].is_error);
    assert_eq!(results[0].request_id.as_deref(), Some("d1"));
    assert!(results[0]
        .query_text
        .contains("keyspace_name = 'shop' AND table_name = 'users'"));
}

#[tokio::test]
async fn test_search_tables_and_columns() {
    let mock = legacy_cluster();
    let driver = mock_driver(&mock);

    let tables = driver.search_tables().await.unwrap();
    assert_eq!(tables.len(), 2);

    let columns = driver
        .search_columns(&[TableFilter {
            keyspace: Some("metrics".to_string()),
            table: Some("samples".to_string()),
        }])
        .await
        .unwrap();
    assert_eq!(columns.len(), 3);

    let none = driver
        .search_columns(&[TableFilter {
            keyspace: Some("nowhere".to_string()),
            table: None,
        }])
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_catalog_failure_yields_no_entries() {
    let mock = MockSession::new().fail_on("FROM system_schema.columns", "read failure");
    let driver = mock_driver(&mock);

    assert!(driver.list_columns(None).await.unwrap().is_empty());
}
