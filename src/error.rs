//! Error types for glance-cql.
//!
//! Defines the main error enum used throughout the crate.

use thiserror::Error;

/// Main error type for glance-cql operations.
#[derive(Error, Debug)]
pub enum GlanceError {
    /// Cluster connection errors (host unreachable, auth failed, closed session, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Statement execution errors (syntax rejected, unavailable replicas, etc.)
    #[error("Query error: {0}")]
    Query(String),

    /// A script opened a BEGIN ... BATCH block that was never closed.
    #[error("Malformed batch: {0}")]
    MalformedBatch(String),

    /// Configuration errors (invalid config file, bad connection string, etc.)
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GlanceError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a malformed batch error with the given message.
    pub fn malformed_batch(msg: impl Into<String>) -> Self {
        Self::MalformedBatch(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Query Error",
            Self::MalformedBatch(_) => "Script Error",
            Self::Config(_) => "Configuration Error",
        }
    }
}

/// Result type alias using GlanceError.
pub type Result<T> = std::result::Result<T, GlanceError>;
