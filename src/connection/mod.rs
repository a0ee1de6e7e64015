//! Connection management for glance-cql.
//!
//! Centralizes the session lifecycle and the per-connection dialect.

pub mod manager;

pub use manager::{ActiveConnection, ConnectionManager};
