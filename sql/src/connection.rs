//! Logical database connection.
//!
//! A [`Connection`] wraps either a freshly opened physical connection or one
//! borrowed from a pool, and tracks whether it is inside an explicit
//! transaction (auto-commit off). It is released on every exit path:
//! [`Connection::close`] is the graceful route, `Drop` is the fallback.
//!
//! A pooled connection dropped while still inside a transaction is detached
//! from its pool instead of being returned, so the next borrower never sees a
//! half-finished transaction.

use crate::provider::ProviderStats;
use sqlx::AnyConnection;
use sqlx::pool::PoolConnection;
use sqlx::{Any, Connection as _, Executor as _};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use txsync_core::{DataAccessError, Result};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one connection lease.
///
/// Two statements observing the same id ran on the same session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

enum Physical {
    Direct(AnyConnection),
    Pooled(PoolConnection<Any>),
}

/// A leased database session.
pub struct Connection {
    id: ConnectionId,
    physical: Option<Physical>,
    in_transaction: bool,
    stats: Arc<ProviderStats>,
}

impl Connection {
    pub(crate) fn direct(connection: AnyConnection, stats: Arc<ProviderStats>) -> Self {
        Self::new(Physical::Direct(connection), stats)
    }

    pub(crate) fn pooled(connection: PoolConnection<Any>, stats: Arc<ProviderStats>) -> Self {
        Self::new(Physical::Pooled(connection), stats)
    }

    fn new(physical: Physical, stats: Arc<ProviderStats>) -> Self {
        stats.record_acquire();
        Self {
            id: ConnectionId::next(),
            physical: Some(physical),
            in_transaction: false,
            stats,
        }
    }

    /// Identity of this lease.
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// Whether this connection was borrowed from a pool.
    #[must_use]
    pub const fn is_pooled(&self) -> bool {
        matches!(self.physical, Some(Physical::Pooled(_)))
    }

    /// Whether each statement commits on its own (no explicit transaction open).
    #[must_use]
    pub const fn auto_commit(&self) -> bool {
        !self.in_transaction
    }

    /// The underlying `sqlx` executor.
    ///
    /// # Errors
    ///
    /// Returns [`DataAccessError::InvalidState`] if the connection was already released.
    pub fn executor(&mut self) -> Result<&mut AnyConnection> {
        match self.physical.as_mut() {
            Some(Physical::Direct(connection)) => Ok(connection),
            Some(Physical::Pooled(connection)) => Ok(&mut **connection),
            None => Err(DataAccessError::InvalidState(format!(
                "{} was already released",
                self.id
            ))),
        }
    }

    /// Leaves auto-commit mode by opening an explicit transaction.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if a transaction is already open on this connection
    /// - `Connection` if the database refuses to start one
    pub async fn begin(&mut self) -> Result<()> {
        if self.in_transaction {
            return Err(DataAccessError::InvalidState(format!(
                "{} already has an open transaction",
                self.id
            )));
        }

        self.executor()?
            .execute("BEGIN")
            .await
            .map_err(|e| DataAccessError::Connection {
                message: format!("failed to begin transaction on {}", self.id),
                source: Some(Box::new(e)),
            })?;

        self.in_transaction = true;
        Ok(())
    }

    /// Makes pending writes durable and returns to auto-commit mode.
    ///
    /// On failure the transaction stays open; the caller is expected to roll back.
    ///
    /// # Errors
    ///
    /// Returns [`DataAccessError::Commit`] if the database rejects the commit.
    pub async fn commit(&mut self) -> Result<()> {
        if !self.in_transaction {
            return Err(DataAccessError::InvalidState(format!(
                "{} has no open transaction to commit",
                self.id
            )));
        }

        let id = self.id;
        self.executor()?
            .execute("COMMIT")
            .await
            .map_err(|e| DataAccessError::Commit {
                message: format!("database rejected commit on {id}"),
                source: Some(Box::new(e)),
            })?;

        self.in_transaction = false;
        Ok(())
    }

    /// Discards pending writes and returns to auto-commit mode.
    ///
    /// # Errors
    ///
    /// Returns [`DataAccessError::Connection`] if the rollback could not be sent.
    pub async fn rollback(&mut self) -> Result<()> {
        if !self.in_transaction {
            return Ok(());
        }

        let id = self.id;
        self.executor()?
            .execute("ROLLBACK")
            .await
            .map_err(|e| DataAccessError::Connection {
                message: format!("failed to roll back on {id}"),
                source: Some(Box::new(e)),
            })?;

        self.in_transaction = false;
        Ok(())
    }

    /// Releases the connection: a direct connection is closed, a pooled one is
    /// returned to its pool. Failures are logged, never raised.
    pub async fn close(mut self) {
        if self.in_transaction {
            if let Err(e) = self.rollback().await {
                tracing::warn!(connection_id = %self.id, error = %e, "Rollback before release failed");
            }
        }

        match self.physical.take() {
            Some(Physical::Direct(connection)) => {
                if let Err(e) = connection.close().await {
                    tracing::warn!(connection_id = %self.id, error = %e, "Error closing connection");
                }
            }
            Some(Physical::Pooled(connection)) => {
                if self.in_transaction {
                    tracing::warn!(
                        connection_id = %self.id,
                        "Pooled connection still inside a transaction; detaching it from the pool"
                    );
                    drop(connection.detach());
                } else {
                    drop(connection);
                }
            }
            None => {}
        }

        tracing::trace!(connection_id = %self.id, "Connection released");
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Some(physical) = self.physical.take() {
            if self.in_transaction {
                tracing::warn!(
                    connection_id = %self.id,
                    "Connection dropped inside an open transaction; discarding it"
                );
                if let Physical::Pooled(connection) = physical {
                    drop(connection.detach());
                }
            } else {
                drop(physical);
            }
        }
        self.stats.record_release();
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("pooled", &self.is_pooled())
            .field("auto_commit", &self.auto_commit())
            .field("released", &self.physical.is_none())
            .finish()
    }
}
