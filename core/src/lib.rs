//! # txsync Core
//!
//! Storage-agnostic types for transactional data access.
//!
//! This crate holds everything business code is allowed to depend on without
//! learning which database technology sits underneath:
//!
//! - [`member`]: the `Member` record and its key type
//! - [`transaction`]: transaction identity and lifecycle status
//! - [`error`]: the [`DataAccessError`] family every storage failure is translated into
//! - [`repository`]: the [`MemberRepository`] contract
//! - [`retry`]: exponential backoff for transient failures
//!
//! The `sqlx` implementation lives in `txsync-sql`.
//!
//! ## Example
//!
//! ```ignore
//! use txsync_core::{DataAccessError, MemberId, MemberRepository};
//!
//! async fn balance<R: MemberRepository>(repo: &R, id: &MemberId) -> Result<i64, DataAccessError> {
//!     Ok(repo.find_by_id(id).await?.money)
//! }
//! ```

pub mod error;
pub mod member;
pub mod repository;
pub mod retry;
pub mod transaction;

// Re-export commonly used types
pub use error::{BoxError, DataAccessError, Result, SqlErrorKind, Transient};
pub use member::{Member, MemberId};
pub use repository::MemberRepository;
pub use retry::{RetryPolicy, retry_transient};
pub use transaction::{TransactionId, TransactionStatus};
