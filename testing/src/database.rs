//! Throwaway SQLite databases.
//!
//! Each [`TestDatabase`] lives in its own temporary directory and is deleted
//! when dropped. A file is used rather than `sqlite::memory:` so that every
//! connection, pooled or direct, sees the same data.

use std::sync::Arc;
use tempfile::TempDir;
use txsync_core::{Member, MemberId, MemberRepository};
use txsync_sql::schema::create_member_table;
use txsync_sql::{
    ConnectionProvider, ConnectionStrategy, DataSourceConfig, SqlMemberRepository, TransactionCoordinator,
    provider_from_config,
};

/// A SQLite database with the `member` table, plus a provider over it.
pub struct TestDatabase {
    _dir: TempDir,
    config: DataSourceConfig,
    provider: Arc<dyn ConnectionProvider>,
}

impl TestDatabase {
    /// Pooled database with default limits.
    ///
    /// # Panics
    ///
    /// Panics if the temporary database cannot be created.
    pub async fn new() -> Self {
        Self::with_config(|config| config).await
    }

    /// Database served by the given strategy.
    ///
    /// # Panics
    ///
    /// Panics if the temporary database cannot be created.
    pub async fn with_strategy(strategy: ConnectionStrategy) -> Self {
        Self::with_config(|config| config.with_strategy(strategy)).await
    }

    /// Database whose configuration is adjusted by `customize`.
    ///
    /// # Panics
    ///
    /// Panics if the temporary database cannot be created.
    #[allow(clippy::expect_used)] // Setup failures are environment problems
    pub async fn with_config(customize: impl FnOnce(DataSourceConfig) -> DataSourceConfig) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("txsync.db").display());
        let config = customize(DataSourceConfig::new(url));
        let provider = provider_from_config(&config).expect("Failed to build provider");

        let repository = SqlMemberRepository::new(Arc::clone(&provider));
        create_member_table(repository.template())
            .await
            .expect("Failed to create member table");

        Self {
            _dir: dir,
            config,
            provider,
        }
    }

    /// Configuration the provider was built from.
    #[must_use]
    pub const fn config(&self) -> &DataSourceConfig {
        &self.config
    }

    /// The shared provider.
    #[must_use]
    pub fn provider(&self) -> Arc<dyn ConnectionProvider> {
        Arc::clone(&self.provider)
    }

    /// A coordinator over the shared provider.
    #[must_use]
    pub fn coordinator(&self) -> TransactionCoordinator {
        TransactionCoordinator::new(self.provider())
    }

    /// A repository over the shared provider.
    #[must_use]
    pub fn repository(&self) -> SqlMemberRepository {
        SqlMemberRepository::new(self.provider())
    }

    /// Insert `members` outside any transaction.
    ///
    /// # Panics
    ///
    /// Panics if an insert fails.
    #[allow(clippy::expect_used)]
    pub async fn seed(&self, members: &[Member]) {
        let repository = self.repository();
        for member in members {
            repository.save(member).await.expect("Failed to seed member");
        }
    }

    /// Committed balance of `member_id`, or `None` if absent.
    ///
    /// # Panics
    ///
    /// Panics on any error other than not-found.
    #[allow(clippy::panic)]
    pub async fn balance(&self, member_id: &str) -> Option<i64> {
        match self.repository().find_by_id(&MemberId::new(member_id)).await {
            Ok(member) => Some(member.money),
            Err(e) if e.is_not_found() => None,
            Err(e) => panic!("Failed to read balance of {member_id}: {e}"),
        }
    }
}

impl std::fmt::Debug for TestDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestDatabase")
            .field("url", &self.config.url)
            .field("strategy", &self.config.strategy)
            .finish()
    }
}
