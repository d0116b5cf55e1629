//! Statement execution helper.
//!
//! [`SqlTemplate`] runs one parameterized statement and takes care of the
//! connection around it. If a transaction is bound to the calling task, the
//! statement runs on that transaction's connection, which stays open.
//! Otherwise a connection is acquired for the single statement and released
//! before returning, on success and on failure alike.
//!
//! The `*_on` variants run on a caller-supplied [`Connection`] and never
//! release it.

use crate::connection::Connection;
use crate::provider::ConnectionProvider;
use crate::sync;
use crate::transaction::BoundConnection;
use crate::translate::{Access, translate};
use sqlx::any::{AnyArguments, AnyRow};
use sqlx::query::Query;
use sqlx::{Any, Execute as _};
use std::sync::Arc;
use txsync_core::Result;

/// A prepared statement with its bound parameters.
pub type AnyQuery<'q> = Query<'q, Any, AnyArguments<'q>>;

pub(crate) enum Lease {
    Bound(BoundConnection),
    Owned(Connection),
}

impl Lease {
    pub(crate) fn connection(&mut self) -> Result<&mut Connection> {
        match self {
            Self::Bound(bound) => bound.connection(),
            Self::Owned(connection) => Ok(connection),
        }
    }
}

/// Runs statements with per-call connection handling.
#[derive(Clone)]
pub struct SqlTemplate {
    provider: Arc<dyn ConnectionProvider>,
}

impl SqlTemplate {
    /// Create a template over `provider`.
    #[must_use]
    pub fn new(provider: Arc<dyn ConnectionProvider>) -> Self {
        Self { provider }
    }

    /// The provider used outside transactions.
    #[must_use]
    pub const fn provider(&self) -> &Arc<dyn ConnectionProvider> {
        &self.provider
    }

    pub(crate) async fn lease(&self) -> Result<Lease> {
        if let Some(handle) = sync::current() {
            return Ok(Lease::Bound(handle.lock().await));
        }
        Ok(Lease::Owned(self.provider.acquire().await?))
    }

    pub(crate) async fn give_back(&self, lease: Lease) {
        if let Lease::Owned(connection) = lease {
            self.provider.release(connection).await;
        }
    }

    /// Execute an `INSERT`, `UPDATE`, `DELETE` or DDL statement.
    ///
    /// Returns the number of affected rows.
    ///
    /// # Errors
    ///
    /// - `Connection` / `PoolExhausted` if no connection could be obtained
    /// - `Write` if the statement fails
    pub async fn update(&self, operation: &str, query: AnyQuery<'_>) -> Result<u64> {
        let mut lease = self.lease().await?;
        let result = match lease.connection() {
            Ok(connection) => Self::update_on(connection, operation, query).await,
            Err(e) => Err(e),
        };
        self.give_back(lease).await;
        result
    }

    /// Execute a query expected to return at most one row, mapping it with `mapper`.
    ///
    /// # Errors
    ///
    /// - `Connection` / `PoolExhausted` if no connection could be obtained
    /// - `Read` if the query fails or the row cannot be mapped
    pub async fn query_optional<T, M>(&self, operation: &str, query: AnyQuery<'_>, mapper: M) -> Result<Option<T>>
    where
        M: FnOnce(&AnyRow) -> std::result::Result<T, sqlx::Error> + Send,
    {
        let mut lease = self.lease().await?;
        let result = match lease.connection() {
            Ok(connection) => Self::query_optional_on(connection, operation, query, mapper).await,
            Err(e) => Err(e),
        };
        self.give_back(lease).await;
        result
    }

    /// Execute a query expected to return exactly one row, mapping it with `mapper`.
    ///
    /// # Errors
    ///
    /// - `Connection` / `PoolExhausted` if no connection could be obtained
    /// - `Read` if the query fails, returns no row, or the row cannot be mapped
    pub async fn query_one<T, M>(&self, operation: &str, query: AnyQuery<'_>, mapper: M) -> Result<T>
    where
        M: FnOnce(&AnyRow) -> std::result::Result<T, sqlx::Error> + Send,
    {
        let mut lease = self.lease().await?;
        let result = match lease.connection() {
            Ok(connection) => Self::query_one_on(connection, operation, query, mapper).await,
            Err(e) => Err(e),
        };
        self.give_back(lease).await;
        result
    }

    /// [`SqlTemplate::update`] on an explicit connection, which is left open.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if `connection` was already released
    /// - `Write` if the statement fails
    pub async fn update_on(connection: &mut Connection, operation: &str, query: AnyQuery<'_>) -> Result<u64> {
        let sql = query.sql();
        let connection_id = connection.id();
        let result = query
            .execute(connection.executor()?)
            .await
            .map_err(|e| translate(operation, sql, Access::Write, e))?;

        tracing::debug!(
            operation,
            connection_id = %connection_id,
            rows_affected = result.rows_affected(),
            "Statement executed"
        );
        Ok(result.rows_affected())
    }

    /// [`SqlTemplate::query_optional`] on an explicit connection, which is left open.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if `connection` was already released
    /// - `Read` if the query fails or the row cannot be mapped
    pub async fn query_optional_on<T, M>(
        connection: &mut Connection,
        operation: &str,
        query: AnyQuery<'_>,
        mapper: M,
    ) -> Result<Option<T>>
    where
        M: FnOnce(&AnyRow) -> std::result::Result<T, sqlx::Error> + Send,
    {
        let sql = query.sql();
        let connection_id = connection.id();
        let row = query
            .fetch_optional(connection.executor()?)
            .await
            .map_err(|e| translate(operation, sql, Access::Read, e))?;

        tracing::debug!(operation, connection_id = %connection_id, found = row.is_some(), "Query executed");
        row.as_ref()
            .map(mapper)
            .transpose()
            .map_err(|e| translate(operation, sql, Access::Read, e))
    }

    /// [`SqlTemplate::query_one`] on an explicit connection, which is left open.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if `connection` was already released
    /// - `Read` if the query fails, returns no row, or the row cannot be mapped
    pub async fn query_one_on<T, M>(
        connection: &mut Connection,
        operation: &str,
        query: AnyQuery<'_>,
        mapper: M,
    ) -> Result<T>
    where
        M: FnOnce(&AnyRow) -> std::result::Result<T, sqlx::Error> + Send,
    {
        let sql = query.sql();
        let row = query
            .fetch_one(connection.executor()?)
            .await
            .map_err(|e| translate(operation, sql, Access::Read, e))?;

        mapper(&row).map_err(|e| translate(operation, sql, Access::Read, e))
    }
}

impl std::fmt::Debug for SqlTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlTemplate")
            .field("strategy", &self.provider.strategy())
            .finish()
    }
}
