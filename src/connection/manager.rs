//! Connection manager for the cluster session lifecycle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use tokio::sync::Mutex;
use tracing::info;

use crate::config::ConnectionConfig;
use crate::db::{Connector, CqlSession};
use crate::dialect::{self, DialectState};
use crate::error::{GlanceError, Result};

/// An open session together with the dialect detected for it.
pub struct ActiveConnection {
    /// Identifier reported on every query result.
    pub id: String,
    /// Session handle.
    pub session: Arc<dyn CqlSession>,
    /// Dialect chosen when the session was opened.
    pub dialect: DialectState,
}

/// Owns the single session for one configured target.
///
/// The session is opened on first use. Concurrent first callers wait on the
/// same initialization, so the cluster is connected and probed only once.
/// Closing empties the slot, so the session is dropped once in-flight
/// statements release it.
pub struct ConnectionManager {
    id: String,
    config: ConnectionConfig,
    connector: Arc<dyn Connector>,
    active: RwLock<Option<Arc<ActiveConnection>>>,
    /// Serializes opening and closing.
    init: Mutex<()>,
    closed: AtomicBool,
}

impl ConnectionManager {
    /// Creates a manager; nothing is opened until first use.
    pub fn new(config: ConnectionConfig, connector: Arc<dyn Connector>) -> Self {
        Self {
            id: config.display_string(),
            config,
            connector,
            active: RwLock::new(None),
            init: Mutex::new(()),
            closed: AtomicBool::new(false),
        }
    }

    /// Uses a saved connection name as the connection id.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.id = name.into();
        self
    }

    /// Connection id reported on query results.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the open connection, opening it if needed.
    ///
    /// Opening connects and then probes the dialect before any caller
    /// statement runs. A failed open leaves the manager unopened.
    pub async fn open(&self) -> Result<Arc<ActiveConnection>> {
        self.ensure_open()?;
        if let Some(active) = self.current() {
            return Ok(active);
        }

        let _guard = self.init.lock().await;
        self.ensure_open()?;
        if let Some(active) = self.current() {
            return Ok(active);
        }

        let session = self.connector.connect(&self.config).await?;
        let dialect = dialect::detect(session.as_ref()).await;
        info!(
            connection = %self.id,
            dialect = %dialect.dialect(),
            "Connection established"
        );
        let active = Arc::new(ActiveConnection {
            id: self.id.clone(),
            session,
            dialect,
        });
        *self.slot_mut() = Some(Arc::clone(&active));
        Ok(active)
    }

    /// Dialect of the open connection, if any.
    pub fn dialect(&self) -> Option<DialectState> {
        self.current().map(|a| a.dialect)
    }

    /// Check if there's an open connection.
    pub fn is_connected(&self) -> bool {
        self.current().is_some() && !self.closed.load(Ordering::SeqCst)
    }

    /// Shuts the session down and releases it. Later calls to
    /// [`ConnectionManager::open`] fail.
    pub async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        // Waits for an open in progress so its session is released too
        let _guard = self.init.lock().await;
        let active = self.slot_mut().take();
        if let Some(active) = active {
            active.session.shutdown().await?;
            info!(connection = %self.id, "Connection closed");
        }
        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(GlanceError::connection("Connection has been closed"));
        }
        Ok(())
    }

    fn current(&self) -> Option<Arc<ActiveConnection>> {
        self.active
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn slot_mut(&self) -> std::sync::RwLockWriteGuard<'_, Option<Arc<ActiveConnection>>> {
        self.active.write().unwrap_or_else(|e| e.into_inner())
    }
}
