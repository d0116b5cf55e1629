//! # txsync Testing
//!
//! Test support for txsync crates.
//!
//! This crate provides:
//! - [`TestDatabase`]: a throwaway SQLite file with the `member` table created
//! - Member fixtures matching the banking scenarios
//! - proptest strategies for member ids and balances
//! - Postgres containers (feature `postgres`, requires Docker)
//!
//! ## Example
//!
//! ```ignore
//! use txsync_testing::{TestDatabase, fixtures};
//!
//! #[tokio::test]
//! async fn test_balance_survives_commit() {
//!     let db = TestDatabase::new().await;
//!     db.seed(&fixtures::standard_members()).await;
//!
//!     assert_eq!(db.balance(fixtures::MEMBER_A).await, Some(fixtures::INITIAL_BALANCE));
//! }
//! ```

pub mod database;
pub mod fixtures;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod properties;

pub use database::TestDatabase;

use tracing_subscriber::{EnvFilter, fmt};

/// Install a test-friendly subscriber once per process.
///
/// Honors `RUST_LOG`, defaulting to `warn`. Later calls are no-ops.
pub fn init_tracing() {
    let _ = fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_test_writer()
        .try_init();
}
