//! Member service: balance transfers.

use crate::error::TransferError;
use txsync_core::{MemberId, MemberRepository, RetryPolicy, retry_transient};
use txsync_sql::TransactionCoordinator;

/// Destination id that always refuses a credit.
///
/// Used to exercise rollback of a transfer whose debit already happened.
pub const BLOCKED_MEMBER: &str = "ex";

/// Moves money between members.
#[derive(Debug, Clone)]
pub struct MemberService<R> {
    coordinator: TransactionCoordinator,
    repository: R,
}

impl<R: MemberRepository> MemberService<R> {
    /// Create a service over `coordinator` and `repository`.
    ///
    /// Both must draw from the same provider for the transfer to be atomic.
    #[must_use]
    pub const fn new(coordinator: TransactionCoordinator, repository: R) -> Self {
        Self {
            coordinator,
            repository,
        }
    }

    /// The repository used for balance reads and writes.
    #[must_use]
    pub const fn repository(&self) -> &R {
        &self.repository
    }

    /// Move `amount` from `from` to `to` in one transaction.
    ///
    /// Either both balances change or neither does.
    ///
    /// # Errors
    ///
    /// - [`TransferError::DataAccess`] if a member is missing or a statement fails
    /// - [`TransferError::Rejected`] if `to` refuses the credit
    /// - [`TransferError::Overflow`] if either new balance does not fit an `i64`
    pub async fn account_transfer(&self, from: &MemberId, to: &MemberId, amount: i64) -> Result<(), TransferError> {
        tracing::info!(from = %from, to = %to, amount, "Transfer requested");

        let result = self
            .coordinator
            .run_in_transaction(|_| self.apply_transfer(from, to, amount))
            .await;

        match &result {
            Ok(()) => {
                tracing::info!(from = %from, to = %to, amount, "Transfer completed");
                metrics::counter!("banking.transfers.completed").increment(1);
            }
            Err(e) => {
                tracing::warn!(from = %from, to = %to, amount, error = %e, "Transfer failed; rolled back");
                metrics::counter!("banking.transfers.failed").increment(1);
            }
        }

        result
    }

    /// [`MemberService::account_transfer`], retried with backoff while the
    /// failure is transient (lock contention, dropped connection, pool timeout).
    ///
    /// # Errors
    ///
    /// Returns the first permanent failure, or the last transient one once
    /// `policy` is exhausted.
    pub async fn account_transfer_with_retry(
        &self,
        policy: &RetryPolicy,
        from: &MemberId,
        to: &MemberId,
        amount: i64,
    ) -> Result<(), TransferError> {
        retry_transient(policy, || self.account_transfer(from, to, amount)).await
    }

    /// The transfer steps, without a transaction boundary of their own.
    ///
    /// Inside a bound transaction the steps share its connection. Called
    /// outside one, every statement commits on its own and a rejected credit
    /// leaves the debit in place.
    ///
    /// # Errors
    ///
    /// Same as [`MemberService::account_transfer`].
    pub async fn apply_transfer(&self, from: &MemberId, to: &MemberId, amount: i64) -> Result<(), TransferError> {
        let from_member = self.repository.find_by_id(from).await?;
        let to_member = self.repository.find_by_id(to).await?;

        let from_balance = from_member
            .money
            .checked_sub(amount)
            .ok_or_else(|| overflow(from, amount))?;
        let to_balance = to_member
            .money
            .checked_add(amount)
            .ok_or_else(|| overflow(to, amount))?;

        self.repository.update(from, from_balance).await?;
        validate(to)?;
        self.repository.update(to, to_balance).await?;

        tracing::debug!(from = %from, to = %to, from_balance, to_balance, "Balances updated");
        Ok(())
    }
}

fn overflow(member: &MemberId, amount: i64) -> TransferError {
    TransferError::Overflow {
        member: member.clone(),
        amount,
    }
}

fn validate(to: &MemberId) -> Result<(), TransferError> {
    if to.as_str() == BLOCKED_MEMBER {
        return Err(TransferError::Rejected {
            to: to.clone(),
            reason: "error during transfer".to_string(),
        });
    }
    Ok(())
}
