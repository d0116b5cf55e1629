//! Transaction identity and lifecycle status.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TRANSACTION_ID: AtomicU64 = AtomicU64::new(1);

/// Identifier of one transaction boundary, used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(u64);

impl TransactionId {
    /// Allocates the next id.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_TRANSACTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx-{}", self.0)
    }
}

/// Lifecycle of a transaction boundary.
///
/// ```text
/// Active ──commit──► Committed
///    │
///    └──rollback──► RolledBack
/// ```
///
/// Both terminal states are closed: no further commit or rollback is legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    /// Writes are provisional
    Active,
    /// Writes were made durable
    Committed,
    /// Writes were discarded
    RolledBack,
}

impl TransactionStatus {
    /// Whether the boundary has been closed.
    #[must_use]
    pub const fn is_closed(self) -> bool {
        !matches!(self, Self::Active)
    }

    /// Database-friendly string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Committed => "committed",
            Self::RolledBack => "rolled_back",
        }
    }

    /// Compact encoding for atomic storage.
    #[must_use]
    pub const fn to_u8(self) -> u8 {
        match self {
            Self::Active => 0,
            Self::Committed => 1,
            Self::RolledBack => 2,
        }
    }

    /// Inverse of [`TransactionStatus::to_u8`]. Unknown values read as `RolledBack`.
    #[must_use]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Active,
            1 => Self::Committed,
            _ => Self::RolledBack,
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_ids_are_unique() {
        let a = TransactionId::next();
        let b = TransactionId::next();
        assert_ne!(a, b);
        assert!(b.value() > a.value());
    }

    #[test]
    fn test_status_encoding() {
        for status in [
            TransactionStatus::Active,
            TransactionStatus::Committed,
            TransactionStatus::RolledBack,
        ] {
            assert_eq!(TransactionStatus::from_u8(status.to_u8()), status);
        }
        assert!(!TransactionStatus::Active.is_closed());
        assert!(TransactionStatus::Committed.is_closed());
        assert!(TransactionStatus::RolledBack.is_closed());
    }
}
