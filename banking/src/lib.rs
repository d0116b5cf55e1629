//! Account transfers between members, each run inside one database transaction.
//!
//! A transfer reads both balances, debits the sender and credits the
//! receiver. All four statements share the transaction's connection through
//! the ambient binding, so the repository never sees a connection parameter.
//!
//! ```text
//! run_in_transaction
//!   ├─ find_by_id(from)
//!   ├─ find_by_id(to)
//!   ├─ update(from, from - amount)
//!   ├─ validate(to)            ── rejected ──► rollback (debit undone)
//!   └─ update(to, to + amount)
//! commit
//! ```
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use txsync_banking::MemberService;
//! use txsync_core::MemberId;
//! use txsync_sql::{DataSourceConfig, SqlMemberRepository, TransactionCoordinator, provider_from_config};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = provider_from_config(&DataSourceConfig::from_env()?)?;
//! let service = MemberService::new(
//!     TransactionCoordinator::new(Arc::clone(&provider)),
//!     SqlMemberRepository::new(provider),
//! );
//!
//! service
//!     .account_transfer(&MemberId::new("memberA"), &MemberId::new("memberB"), 2_000)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod service;

pub use error::TransferError;
pub use service::{BLOCKED_MEMBER, MemberService};
