//! Transfer errors.

use thiserror::Error;
use txsync_core::{DataAccessError, MemberId, Transient};

/// Why a transfer did not complete.
///
/// Whatever the variant, no partial effect of the transfer is visible.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Reading or writing a balance failed.
    #[error(transparent)]
    DataAccess(#[from] DataAccessError),

    /// The destination refused the credit.
    #[error("Transfer to {to} rejected: {reason}")]
    Rejected {
        /// Destination member
        to: MemberId,
        /// Why it was refused
        reason: String,
    },

    /// Applying the amount would overflow a balance.
    #[error("Transfer of {amount} overflows the balance of {member}")]
    Overflow {
        /// Member whose balance would overflow
        member: MemberId,
        /// Requested amount
        amount: i64,
    },
}

impl Transient for TransferError {
    fn is_transient(&self) -> bool {
        match self {
            Self::DataAccess(e) => e.is_transient(),
            Self::Rejected { .. } | Self::Overflow { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transient_data_access_errors_are_retryable() {
        assert!(TransferError::from(DataAccessError::connection("reset")).is_transient());
        assert!(!TransferError::from(DataAccessError::member_not_found("memberA")).is_transient());
        assert!(
            !TransferError::Rejected {
                to: MemberId::new("ex"),
                reason: "blocked".into(),
            }
            .is_transient()
        );
        assert!(
            !TransferError::Overflow {
                member: MemberId::new("memberB"),
                amount: i64::MAX,
            }
            .is_transient()
        );
    }
}
