//! Connection providers.
//!
//! Two strategies sit behind one [`ConnectionProvider`] trait:
//!
//! - [`DirectConnectionProvider`] opens a new physical connection on every
//!   acquire and closes it on release.
//! - [`PooledConnectionProvider`] borrows from a bounded `sqlx` pool and returns
//!   the connection on release. Acquisition waits up to the configured timeout
//!   and then fails with [`DataAccessError::PoolExhausted`].
//!
//! Callers depend on `Arc<dyn ConnectionProvider>` and never learn which
//! strategy is in use.

use crate::config::{ConfigError, ConnectionStrategy, DataSourceConfig};
use crate::connection::Connection;
use crate::translate::translate_acquire;
use futures::future::BoxFuture;
use sqlx::any::AnyPoolOptions;
use sqlx::{AnyConnection, AnyPool, Connection as _};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use txsync_core::{DataAccessError, Result};

/// Source of database connections.
pub trait ConnectionProvider: Send + Sync {
    /// Obtain a connection in auto-commit mode.
    ///
    /// # Errors
    ///
    /// - `Connection` if the database is unreachable or rejects the credentials
    /// - `PoolExhausted` if a pooled provider has no free connection in time
    fn acquire(&self) -> BoxFuture<'_, Result<Connection>>;

    /// Give a connection back. Never fails; problems are logged.
    fn release(&self, connection: Connection) -> BoxFuture<'_, ()> {
        Box::pin(connection.close())
    }

    /// The strategy behind this provider.
    fn strategy(&self) -> ConnectionStrategy;

    /// Lease counters.
    fn stats(&self) -> &ProviderStats;
}

/// Lease counters shared by a provider and every connection it hands out.
#[derive(Debug, Default)]
pub struct ProviderStats {
    acquired: AtomicU64,
    released: AtomicU64,
}

impl ProviderStats {
    /// Connections handed out so far.
    #[must_use]
    pub fn acquired(&self) -> u64 {
        self.acquired.load(Ordering::SeqCst)
    }

    /// Connections given back (closed, returned or discarded) so far.
    #[must_use]
    pub fn released(&self) -> u64 {
        self.released.load(Ordering::SeqCst)
    }

    /// Connections currently leased.
    #[must_use]
    pub fn in_use(&self) -> u64 {
        self.acquired().saturating_sub(self.released())
    }

    pub(crate) fn record_acquire(&self) {
        self.acquired.fetch_add(1, Ordering::SeqCst);
        metrics::counter!("txsync.connections.acquired").increment(1);
    }

    pub(crate) fn record_release(&self) {
        self.released.fetch_add(1, Ordering::SeqCst);
        metrics::counter!("txsync.connections.released").increment(1);
    }
}

/// Opens a new physical connection per acquire.
#[derive(Debug)]
pub struct DirectConnectionProvider {
    url: String,
    connect_timeout: Duration,
    stats: Arc<ProviderStats>,
}

impl DirectConnectionProvider {
    /// Create a provider for `config`. No connection is opened yet.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] if credentials cannot be applied to the URL.
    pub fn new(config: &DataSourceConfig) -> std::result::Result<Self, ConfigError> {
        sqlx::any::install_default_drivers();
        Ok(Self {
            url: config.connect_url()?,
            connect_timeout: config.connect_timeout,
            stats: Arc::new(ProviderStats::default()),
        })
    }

    async fn connect(&self) -> Result<Connection> {
        let physical = match tokio::time::timeout(self.connect_timeout, AnyConnection::connect(&self.url)).await {
            Ok(Ok(physical)) => physical,
            Ok(Err(e)) => return Err(translate_acquire(e, self.connect_timeout)),
            Err(_) => {
                return Err(DataAccessError::connection(format!(
                    "timed out after {:?} opening a connection",
                    self.connect_timeout
                )));
            }
        };

        let connection = Connection::direct(physical, Arc::clone(&self.stats));
        tracing::debug!(connection_id = %connection.id(), strategy = "direct", "Connection opened");
        Ok(connection)
    }
}

impl ConnectionProvider for DirectConnectionProvider {
    fn acquire(&self) -> BoxFuture<'_, Result<Connection>> {
        Box::pin(self.connect())
    }

    fn strategy(&self) -> ConnectionStrategy {
        ConnectionStrategy::Direct
    }

    fn stats(&self) -> &ProviderStats {
        &self.stats
    }
}

/// Borrows connections from a bounded pool.
#[derive(Debug, Clone)]
pub struct PooledConnectionProvider {
    pool: AnyPool,
    acquire_timeout: Duration,
    stats: Arc<ProviderStats>,
}

impl PooledConnectionProvider {
    /// Create a lazily connecting pool for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] if the URL cannot be parsed by any
    /// installed driver.
    pub fn new(config: &DataSourceConfig) -> std::result::Result<Self, ConfigError> {
        sqlx::any::install_default_drivers();
        let pool = AnyPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout)
            .connect_lazy(&config.connect_url()?)
            .map_err(|e| ConfigError::InvalidUrl(e.to_string()))?;

        Ok(Self::from_pool(pool, config.acquire_timeout))
    }

    /// Wrap an existing pool.
    #[must_use]
    pub fn from_pool(pool: AnyPool, acquire_timeout: Duration) -> Self {
        Self {
            pool,
            acquire_timeout,
            stats: Arc::new(ProviderStats::default()),
        }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Close the pool, waiting for leased connections to come back.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn borrow(&self) -> Result<Connection> {
        let physical = self.pool.acquire().await.map_err(|e| {
            let err = translate_acquire(e, self.acquire_timeout);
            if matches!(err, DataAccessError::PoolExhausted { .. }) {
                tracing::warn!(
                    timeout_ms = u64::try_from(self.acquire_timeout.as_millis()).unwrap_or(u64::MAX),
                    pool_size = self.pool.size(),
                    "Connection pool exhausted"
                );
                metrics::counter!("txsync.connections.pool_exhausted").increment(1);
            }
            err
        })?;

        let connection = Connection::pooled(physical, Arc::clone(&self.stats));
        tracing::debug!(connection_id = %connection.id(), strategy = "pooled", "Connection borrowed");
        Ok(connection)
    }
}

impl ConnectionProvider for PooledConnectionProvider {
    fn acquire(&self) -> BoxFuture<'_, Result<Connection>> {
        Box::pin(self.borrow())
    }

    fn strategy(&self) -> ConnectionStrategy {
        ConnectionStrategy::Pooled
    }

    fn stats(&self) -> &ProviderStats {
        &self.stats
    }
}

/// Build the provider selected by `config.strategy`.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidUrl`] if the URL is unusable.
pub fn provider_from_config(
    config: &DataSourceConfig,
) -> std::result::Result<Arc<dyn ConnectionProvider>, ConfigError> {
    tracing::info!(strategy = config.strategy.as_str(), "Configuring connection provider");
    Ok(match config.strategy {
        ConnectionStrategy::Direct => Arc::new(DirectConnectionProvider::new(config)?),
        ConnectionStrategy::Pooled => Arc::new(PooledConnectionProvider::new(config)?),
    })
}
