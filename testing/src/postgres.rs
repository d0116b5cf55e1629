//! Postgres databases in Docker via testcontainers.

use std::sync::Arc;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use txsync_sql::schema::create_member_table;
use txsync_sql::{
    ConnectionProvider, ConnectionStrategy, DataSourceConfig, SqlMemberRepository, TransactionCoordinator,
    provider_from_config,
};

/// A running Postgres 16 container with the `member` table created.
///
/// The container stops when this value is dropped.
pub struct PostgresDatabase {
    _container: ContainerAsync<Postgres>,
    provider: Arc<dyn ConnectionProvider>,
}

impl PostgresDatabase {
    /// Start a container served by a pool.
    ///
    /// # Panics
    ///
    /// Panics if Docker is unavailable or the container does not start.
    pub async fn start() -> Self {
        Self::start_with(ConnectionStrategy::Pooled).await
    }

    /// Start a container served by `strategy`.
    ///
    /// # Panics
    ///
    /// Panics if Docker is unavailable or the container does not start.
    #[allow(clippy::expect_used)] // Setup failures are environment problems
    pub async fn start_with(strategy: ConnectionStrategy) -> Self {
        let container = Postgres::default()
            .start()
            .await
            .expect("Failed to start postgres container");

        let port = container
            .get_host_port_ipv4(5432)
            .await
            .expect("Failed to get postgres port");

        let config = DataSourceConfig::new(format!("postgres://127.0.0.1:{port}/postgres"))
            .with_credentials("postgres", "postgres")
            .with_strategy(strategy)
            .with_max_connections(5);
        let provider = provider_from_config(&config).expect("Failed to build provider");

        create_member_table(SqlMemberRepository::new(Arc::clone(&provider)).template())
            .await
            .expect("Failed to create member table");

        Self {
            _container: container,
            provider,
        }
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
}
