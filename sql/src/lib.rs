//! # txsync SQL
//!
//! `sqlx`-backed data access with transaction synchronization.
//!
//! ## Features
//!
//! - Connection providers: direct (connection per acquire) or pooled
//! - A transaction coordinator with begin / commit / rollback and a scoped
//!   `run_in_transaction` wrapper
//! - Ambient transaction binding per task, so repositories called inside a
//!   unit of work share its connection without passing it around
//! - Driver error translation into [`DataAccessError`](txsync_core::DataAccessError)
//! - A parameterized member repository for Postgres and SQLite
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use txsync_core::{DataAccessError, MemberId, MemberRepository};
//! use txsync_sql::{DataSourceConfig, SqlMemberRepository, TransactionCoordinator, provider_from_config};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = provider_from_config(&DataSourceConfig::from_env()?)?;
//! let coordinator = TransactionCoordinator::new(Arc::clone(&provider));
//! let repository = SqlMemberRepository::new(provider);
//!
//! coordinator
//!     .run_in_transaction(|_| async {
//!         let id = MemberId::new("memberA");
//!         let member = repository.find_by_id(&id).await?;
//!         repository.update(&id, member.money - 100).await?;
//!         Ok::<_, DataAccessError>(())
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod connection;
pub mod coordinator;
pub mod provider;
pub mod repository;
pub mod schema;
pub mod sync;
pub mod template;
pub mod transaction;
pub mod translate;

pub use config::{ConfigError, ConnectionStrategy, DataSourceConfig};
pub use connection::{Connection, ConnectionId};
pub use coordinator::TransactionCoordinator;
pub use provider::{
    ConnectionProvider, DirectConnectionProvider, PooledConnectionProvider, ProviderStats, provider_from_config,
};
pub use repository::SqlMemberRepository;
pub use template::{AnyQuery, SqlTemplate};
pub use transaction::TransactionHandle;
