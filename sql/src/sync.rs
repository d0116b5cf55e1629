//! Ambient transaction binding.
//!
//! A transaction is bound to a logical task for the duration of a future, via
//! a tokio task-local. Data-access code running inside that future discovers
//! the binding with [`current`] and reuses its connection instead of acquiring
//! a new one. Concurrent tasks each see only their own binding.
//!
//! Spawned tasks do not inherit the binding.

use crate::transaction::TransactionHandle;
use std::future::Future;

tokio::task_local! {
    static CURRENT_TRANSACTION: TransactionHandle;
}

/// The active transaction bound to the calling task, if any.
///
/// A binding whose transaction has already been committed or rolled back is
/// treated as absent.
#[must_use]
pub fn current() -> Option<TransactionHandle> {
    CURRENT_TRANSACTION
        .try_with(TransactionHandle::clone)
        .ok()
        .filter(TransactionHandle::is_active)
}

/// Whether an active transaction is bound to the calling task.
#[must_use]
pub fn is_bound() -> bool {
    current().is_some()
}

pub(crate) async fn scope<F: Future>(handle: TransactionHandle, future: F) -> F::Output {
    CURRENT_TRANSACTION.scope(handle, future).await
}
