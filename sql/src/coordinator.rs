//! Transaction coordinator.
//!
//! Owns the lifecycle of transaction boundaries:
//!
//! 1. `begin` acquires a connection, remembers its auto-commit mode and opens
//!    an explicit transaction. If a transaction is already bound to the
//!    calling task, the caller joins it as a participant instead.
//! 2. `commit` / `rollback` close the boundary, restore auto-commit and release
//!    the connection exactly once.
//! 3. [`TransactionCoordinator::run_in_transaction`] wraps a unit of work:
//!    success commits, an error or a panic rolls back.
//!
//! ```text
//! begin ──► Active ──commit ok──────────► Committed ──► release
//!              │
//!              ├──commit failed──────────► RolledBack ─► release
//!              └──rollback / error / panic ► RolledBack ─► release
//! ```

use crate::connection::Connection;
use crate::provider::ConnectionProvider;
use crate::sync;
use crate::transaction::TransactionHandle;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use txsync_core::{DataAccessError, Result, TransactionStatus};

/// Opens, commits and rolls back transactions over a [`ConnectionProvider`].
#[derive(Clone)]
pub struct TransactionCoordinator {
    provider: Arc<dyn ConnectionProvider>,
}

impl TransactionCoordinator {
    /// Create a coordinator drawing connections from `provider`.
    #[must_use]
    pub fn new(provider: Arc<dyn ConnectionProvider>) -> Self {
        Self { provider }
    }

    /// The provider behind this coordinator.
    #[must_use]
    pub const fn provider(&self) -> &Arc<dyn ConnectionProvider> {
        &self.provider
    }

    /// Open a transaction boundary.
    ///
    /// If the calling task already has an active transaction bound, returns a
    /// participant handle on that transaction instead of opening a new one.
    ///
    /// The returned handle is not bound to the calling task. Repository calls
    /// join the transaction only inside [`TransactionHandle::bind`] or
    /// [`TransactionCoordinator::run_in_transaction`]; until then they run on
    /// their own connections, and a second bare `begin` opens a second
    /// transaction.
    ///
    /// # Errors
    ///
    /// - `Connection` / `PoolExhausted` if no connection could be obtained or
    ///   the database refused to start a transaction. Nothing is leaked.
    pub async fn begin(&self) -> Result<TransactionHandle> {
        if let Some(existing) = sync::current() {
            tracing::debug!(transaction_id = %existing.id(), "Participating in existing transaction");
            return Ok(existing.participant());
        }

        let mut connection = self.provider.acquire().await?;
        let connection_id = connection.id();
        let restore_auto_commit = connection.auto_commit();

        if let Err(e) = connection.begin().await {
            tracing::warn!(connection_id = %connection_id, error = %e, "Failed to start transaction");
            self.provider.release(connection).await;
            return Err(e);
        }

        let handle = TransactionHandle::open(connection, restore_auto_commit);
        tracing::debug!(
            transaction_id = %handle.id(),
            connection_id = %connection_id,
            "Transaction started"
        );
        metrics::counter!("txsync.transactions.begun").increment(1);

        Ok(handle)
    }

    /// Make the transaction's writes durable and release its connection.
    ///
    /// For a participant handle this is a no-op: the owner decides.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if the transaction is already committed or rolled back
    /// - `Commit` if the database rejected the commit or a participant marked
    ///   the transaction rollback-only. The transaction is rolled back and its
    ///   connection released before the error is returned.
    pub async fn commit(&self, handle: &TransactionHandle) -> Result<()> {
        if !handle.is_owner() {
            return if handle.is_active() {
                tracing::trace!(transaction_id = %handle.id(), "Participant commit deferred to owner");
                Ok(())
            } else {
                Err(closed("commit", handle))
            };
        }

        let mut bound = handle.lock().await;
        if !handle.is_active() {
            return Err(closed("commit", handle));
        }
        let Some(mut connection) = bound.take_connection() else {
            return Err(closed("commit", handle));
        };
        let restore_auto_commit = bound.restore_auto_commit();

        if bound.rollback_only() {
            handle.set_status(TransactionStatus::RolledBack);
            rollback_quietly(&mut connection, handle).await;
            self.finish(connection, restore_auto_commit).await;
            tracing::info!(transaction_id = %handle.id(), "Transaction was marked rollback-only; rolled back");
            metrics::counter!("txsync.transactions.rolled_back").increment(1);
            return Err(DataAccessError::Commit {
                message: format!("{} was marked rollback-only by a participant", handle.id()),
                source: None,
            });
        }

        match connection.commit().await {
            Ok(()) => {
                handle.set_status(TransactionStatus::Committed);
                self.finish(connection, restore_auto_commit).await;
                tracing::debug!(transaction_id = %handle.id(), "Transaction committed");
                metrics::counter!("txsync.transactions.committed").increment(1);
                Ok(())
            }
            Err(e) => {
                handle.set_status(TransactionStatus::RolledBack);
                rollback_quietly(&mut connection, handle).await;
                self.finish(connection, restore_auto_commit).await;
                tracing::error!(transaction_id = %handle.id(), error = %e, "Commit failed; transaction rolled back");
                metrics::counter!("txsync.transactions.commit_failed").increment(1);
                Err(e)
            }
        }
    }

    /// Discard the transaction's writes and release its connection.
    ///
    /// For a participant handle the owning transaction is marked rollback-only
    /// and the owner's eventual commit fails. A failed rollback is logged, not
    /// raised: the connection is released either way.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if the transaction is already committed or rolled back
    pub async fn rollback(&self, handle: &TransactionHandle) -> Result<()> {
        let mut bound = handle.lock().await;

        if !handle.is_owner() {
            if !handle.is_active() {
                return Err(closed("rollback", handle));
            }
            bound.mark_rollback_only();
            tracing::debug!(transaction_id = %handle.id(), "Participant marked transaction rollback-only");
            return Ok(());
        }

        if !handle.is_active() {
            return Err(closed("rollback", handle));
        }
        let Some(mut connection) = bound.take_connection() else {
            return Err(closed("rollback", handle));
        };
        let restore_auto_commit = bound.restore_auto_commit();

        handle.set_status(TransactionStatus::RolledBack);
        rollback_quietly(&mut connection, handle).await;
        self.finish(connection, restore_auto_commit).await;

        tracing::debug!(transaction_id = %handle.id(), "Transaction rolled back");
        metrics::counter!("txsync.transactions.rolled_back").increment(1);
        Ok(())
    }

    /// Run `work` inside a transaction.
    ///
    /// The transaction is bound to the task while `work` runs, so repositories
    /// called from it share one connection. `Ok` commits, `Err` rolls back and
    /// is returned unchanged, a panic rolls back and resumes unwinding.
    ///
    /// Called while another transaction is bound, `work` joins it: nothing is
    /// committed here, and an `Err` marks the outer transaction rollback-only.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `work`, or a [`DataAccessError`] converted
    /// into `E` if the transaction could not be opened or committed.
    pub async fn run_in_transaction<T, E, F, Fut>(&self, work: F) -> std::result::Result<T, E>
    where
        F: FnOnce(TransactionHandle) -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: From<DataAccessError>,
    {
        let handle = self.begin().await?;
        let outcome = AssertUnwindSafe(handle.bind(work(handle.clone())))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(value)) => {
                self.commit(&handle).await?;
                Ok(value)
            }
            Ok(Err(err)) => {
                tracing::debug!(transaction_id = %handle.id(), "Unit of work failed; rolling back");
                if let Err(e) = self.rollback(&handle).await {
                    tracing::warn!(transaction_id = %handle.id(), error = %e, "Rollback after failure did not complete");
                }
                Err(err)
            }
            Err(panic) => {
                tracing::error!(transaction_id = %handle.id(), "Unit of work panicked; rolling back");
                if let Err(e) = self.rollback(&handle).await {
                    tracing::warn!(transaction_id = %handle.id(), error = %e, "Rollback after panic did not complete");
                }
                std::panic::resume_unwind(panic)
            }
        }
    }

    async fn finish(&self, mut connection: Connection, restore_auto_commit: bool) {
        if restore_auto_commit && !connection.auto_commit() {
            if let Err(e) = connection.rollback().await {
                tracing::warn!(connection_id = %connection.id(), error = %e, "Could not restore auto-commit");
            }
        }
        self.provider.release(connection).await;
    }
}

impl std::fmt::Debug for TransactionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionCoordinator")
            .field("strategy", &self.provider.strategy())
            .finish()
    }
}

async fn rollback_quietly(connection: &mut Connection, handle: &TransactionHandle) {
    if let Err(e) = connection.rollback().await {
        tracing::warn!(
            transaction_id = %handle.id(),
            connection_id = %connection.id(),
            error = %e,
            "Rollback failed; connection will be discarded"
        );
    }
}

fn closed(action: &str, handle: &TransactionHandle) -> DataAccessError {
    DataAccessError::InvalidState(format!(
        "cannot {action} {}: transaction is already {}",
        handle.id(),
        handle.status()
    ))
}
