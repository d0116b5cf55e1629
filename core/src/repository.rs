//! Member repository contract.
//!
//! # Connection ownership
//!
//! Implementations resolve a connection per call: if a transaction is bound to
//! the calling context they use its connection and leave it open, otherwise they
//! acquire one, run the statement and release it before returning. Callers never
//! see which path was taken.
//!
//! # Dyn Compatibility
//!
//! Methods return boxed futures so the trait can be used as
//! `Arc<dyn MemberRepository>`.

use crate::error::Result;
use crate::member::{Member, MemberId};
use futures::future::BoxFuture;

/// Parameterized CRUD access to the `member` table.
pub trait MemberRepository: Send + Sync {
    /// Inserts a new member and returns it.
    ///
    /// # Errors
    ///
    /// - `Write` with kind `DuplicateKey` if the id already exists
    /// - `Connection` / `PoolExhausted` if no connection could be obtained
    fn save<'a>(&'a self, member: &'a Member) -> BoxFuture<'a, Result<Member>>;

    /// Loads a member by its unique key.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no row matches
    /// - `Read` if the query fails
    fn find_by_id<'a>(&'a self, member_id: &'a MemberId) -> BoxFuture<'a, Result<Member>>;

    /// Sets a member's balance and returns the affected row count.
    ///
    /// An unknown id is not an error: the count is simply 0.
    ///
    /// # Errors
    ///
    /// - `Write` if the statement fails
    fn update<'a>(&'a self, member_id: &'a MemberId, money: i64) -> BoxFuture<'a, Result<u64>>;

    /// Deletes a member. Deleting an absent id succeeds.
    ///
    /// # Errors
    ///
    /// - `Write` if the statement fails
    fn delete<'a>(&'a self, member_id: &'a MemberId) -> BoxFuture<'a, Result<()>>;
}
