//! Integration tests for glance-cql.

pub mod catalog_test;
pub mod live_test;
pub mod records_test;
pub mod script_test;

use std::sync::Arc;

use glance_cql::config::{ConnectionConfig, QueryConfig};
use glance_cql::db::MockSession;
use glance_cql::driver::CqlDriver;

/// A driver on top of a clone of `mock`, so the test keeps the spy handle.
pub fn mock_driver(mock: &MockSession) -> CqlDriver {
    mock_driver_with(mock, QueryConfig::default())
}

pub fn mock_driver_with(mock: &MockSession, query: QueryConfig) -> CqlDriver {
    CqlDriver::new(ConnectionConfig::default(), Arc::new(mock.clone()), &query)
}
