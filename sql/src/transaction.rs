//! Transaction handles.
//!
//! A [`TransactionHandle`] is the caller's view of one transaction boundary:
//! its id, its status and the connection it owns. Handles are cheap to clone;
//! all clones observe the same status. Only the handle returned by the
//! outermost `begin` is the owner; handles returned by nested `begin` calls are
//! participants whose commit is a no-op and whose rollback marks the boundary
//! rollback-only.

use crate::connection::{Connection, ConnectionId};
use crate::sync;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use tokio::sync::{Mutex, OwnedMutexGuard};
use txsync_core::{DataAccessError, Result, TransactionId, TransactionStatus};

pub(crate) struct Boundary {
    connection: Option<Connection>,
    restore_auto_commit: bool,
    rollback_only: bool,
}

struct Shared {
    id: TransactionId,
    status: AtomicU8,
    boundary: Arc<Mutex<Boundary>>,
}

impl Drop for Shared {
    fn drop(&mut self) {
        if TransactionStatus::from_u8(self.status.load(Ordering::SeqCst)) == TransactionStatus::Active {
            tracing::warn!(
                transaction_id = %self.id,
                "Transaction dropped without commit or rollback; its writes are discarded"
            );
        }
    }
}

/// Handle to an open (or closed) transaction.
#[derive(Clone)]
pub struct TransactionHandle {
    shared: Arc<Shared>,
    owner: bool,
}

impl TransactionHandle {
    pub(crate) fn open(connection: Connection, restore_auto_commit: bool) -> Self {
        Self {
            shared: Arc::new(Shared {
                id: TransactionId::next(),
                status: AtomicU8::new(TransactionStatus::Active.to_u8()),
                boundary: Arc::new(Mutex::new(Boundary {
                    connection: Some(connection),
                    restore_auto_commit,
                    rollback_only: false,
                })),
            }),
            owner: true,
        }
    }

    pub(crate) fn participant(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            owner: false,
        }
    }

    /// Identifier used in logs.
    #[must_use]
    pub fn id(&self) -> TransactionId {
        self.shared.id
    }

    /// Current lifecycle status.
    #[must_use]
    pub fn status(&self) -> TransactionStatus {
        TransactionStatus::from_u8(self.shared.status.load(Ordering::SeqCst))
    }

    /// Whether the transaction is still open.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status() == TransactionStatus::Active
    }

    /// Whether this handle controls commit and rollback.
    #[must_use]
    pub const fn is_owner(&self) -> bool {
        self.owner
    }

    /// Whether a participant has asked for the whole transaction to roll back.
    pub async fn is_rollback_only(&self) -> bool {
        self.shared.boundary.lock().await.rollback_only
    }

    /// Id of the bound connection, or `None` once the transaction is closed.
    pub async fn connection_id(&self) -> Option<ConnectionId> {
        self.shared.boundary.lock().await.connection.as_ref().map(Connection::id)
    }

    /// Run `future` with this transaction bound to the current task.
    ///
    /// Repositories called inside `future` share this transaction's connection.
    pub fn bind<F: Future>(&self, future: F) -> impl Future<Output = F::Output> {
        sync::scope(self.clone(), future)
    }

    pub(crate) fn set_status(&self, status: TransactionStatus) {
        self.shared.status.store(status.to_u8(), Ordering::SeqCst);
    }

    pub(crate) async fn lock(&self) -> BoundConnection {
        BoundConnection {
            transaction_id: self.shared.id,
            guard: Arc::clone(&self.shared.boundary).lock_owned().await,
        }
    }
}

impl fmt::Debug for TransactionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionHandle")
            .field("id", &self.shared.id)
            .field("status", &self.status())
            .field("owner", &self.owner)
            .finish()
    }
}

/// Exclusive access to a transaction's connection.
///
/// Statements run through this guard one at a time, in order.
pub(crate) struct BoundConnection {
    transaction_id: TransactionId,
    guard: OwnedMutexGuard<Boundary>,
}

impl BoundConnection {
    pub(crate) fn connection(&mut self) -> Result<&mut Connection> {
        let transaction_id = self.transaction_id;
        self.guard.connection.as_mut().ok_or_else(|| {
            DataAccessError::InvalidState(format!("{transaction_id} is already closed"))
        })
    }

    pub(crate) fn take_connection(&mut self) -> Option<Connection> {
        self.guard.connection.take()
    }

    pub(crate) fn restore_auto_commit(&self) -> bool {
        self.guard.restore_auto_commit
    }

    pub(crate) fn rollback_only(&self) -> bool {
        self.guard.rollback_only
    }

    pub(crate) fn mark_rollback_only(&mut self) {
        self.guard.rollback_only = true;
    }
}
