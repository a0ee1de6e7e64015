//! glance-cql - run CQL scripts and browse Cassandra/ScyllaDB schemas.
//!
//! This library exposes the core modules for the binary and integration tests.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod connection;
pub mod db;
pub mod dialect;
pub mod driver;
pub mod error;
pub mod logging;
pub mod output;
pub mod query;
