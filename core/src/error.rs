//! Data-access error taxonomy.
//!
//! Driver errors never cross the repository boundary as-is. They are
//! translated into [`DataAccessError`], so business code branches on this
//! enum and [`SqlErrorKind`] rather than on vendor error codes.

use std::time::Duration;
use thiserror::Error;

/// Boxed source error carried by translated failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for data-access operations.
pub type Result<T> = std::result::Result<T, DataAccessError>;

/// Classification of a failed statement, independent of the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlErrorKind {
    /// Unique or primary key constraint violated
    DuplicateKey,
    /// Foreign key, not-null or check constraint violated
    IntegrityViolation,
    /// Statement could not be parsed or references unknown objects
    BadSqlGrammar,
    /// Lock contention, serialization failure or a dropped link; retrying may succeed
    Transient,
    /// A column could not be mapped to the requested type
    Decode,
    /// Anything else
    Other,
}

impl SqlErrorKind {
    /// Returns `true` if retrying the same statement may succeed.
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::Transient)
    }
}

/// Errors that can occur while accessing data.
#[derive(Error, Debug)]
pub enum DataAccessError {
    /// The underlying resource could not produce a connection.
    #[error("Failed to obtain connection: {message}")]
    Connection {
        /// What went wrong
        message: String,
        /// Driver error, if any
        #[source]
        source: Option<BoxError>,
    },

    /// No pooled connection became free within the acquire timeout.
    #[error("Connection pool exhausted: no connection available within {timeout:?}")]
    PoolExhausted {
        /// Configured acquire timeout
        timeout: Duration,
    },

    /// A query failed.
    #[error("Read failed in {operation} ({kind:?}): {sql}")]
    Read {
        /// Logical operation name (e.g. `find_by_id`)
        operation: String,
        /// The statement that failed
        sql: String,
        /// Driver-independent classification
        kind: SqlErrorKind,
        /// Root driver error
        #[source]
        source: BoxError,
    },

    /// An insert, update or delete failed.
    #[error("Write failed in {operation} ({kind:?}): {sql}")]
    Write {
        /// Logical operation name (e.g. `save`)
        operation: String,
        /// The statement that failed
        sql: String,
        /// Driver-independent classification
        kind: SqlErrorKind,
        /// Root driver error
        #[source]
        source: BoxError,
    },

    /// The requested row does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record looked up
        entity: &'static str,
        /// Key that was looked up
        id: String,
    },

    /// The database rejected the commit; the transaction must be treated as failed.
    #[error("Commit failed: {message}")]
    Commit {
        /// What went wrong
        message: String,
        /// Driver error, if any
        #[source]
        source: Option<BoxError>,
    },

    /// API misuse, such as committing a closed transaction.
    #[error("Invalid transaction state: {0}")]
    InvalidState(String),
}

impl DataAccessError {
    /// Builds a [`DataAccessError::Connection`] without a driver cause.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Builds a [`DataAccessError::NotFound`] for a member id.
    #[must_use]
    pub fn member_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "member",
            id: id.into(),
        }
    }

    /// Statement classification for `Read`/`Write` errors.
    #[must_use]
    pub const fn kind(&self) -> Option<SqlErrorKind> {
        match self {
            Self::Read { kind, .. } | Self::Write { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// The failing SQL text for `Read`/`Write` errors.
    #[must_use]
    pub fn sql(&self) -> Option<&str> {
        match self {
            Self::Read { sql, .. } | Self::Write { sql, .. } => Some(sql),
            _ => None,
        }
    }

    /// Returns `true` for duplicate key violations.
    #[must_use]
    pub fn is_duplicate_key(&self) -> bool {
        self.kind() == Some(SqlErrorKind::DuplicateKey)
    }

    /// Returns `true` for a logical miss rather than a technical failure.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Errors that know whether retrying might help.
pub trait Transient {
    /// Returns `true` if the same operation may succeed when retried.
    fn is_transient(&self) -> bool;
}

impl Transient for DataAccessError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Connection { .. } | Self::PoolExhausted { .. } => true,
            Self::Read { kind, .. } | Self::Write { kind, .. } => kind.is_transient(),
            Self::NotFound { .. } | Self::Commit { .. } | Self::InvalidState(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_error(kind: SqlErrorKind) -> DataAccessError {
        DataAccessError::Write {
            operation: "save".to_string(),
            sql: "insert into member(member_id, money) values ($1, $2)".to_string(),
            kind,
            source: "driver failure".into(),
        }
    }

    #[test]
    fn test_transient_classification() {
        assert!(DataAccessError::connection("refused").is_transient());
        assert!(
            DataAccessError::PoolExhausted {
                timeout: Duration::from_millis(100)
            }
            .is_transient()
        );
        assert!(write_error(SqlErrorKind::Transient).is_transient());
        assert!(!write_error(SqlErrorKind::DuplicateKey).is_transient());
        assert!(!DataAccessError::member_not_found("nobody").is_transient());
        assert!(!DataAccessError::InvalidState("closed".into()).is_transient());
    }

    #[test]
    fn test_accessors() {
        let err = write_error(SqlErrorKind::DuplicateKey);
        assert!(err.is_duplicate_key());
        assert_eq!(
            err.sql(),
            Some("insert into member(member_id, money) values ($1, $2)")
        );
        assert!(std::error::Error::source(&err).is_some());

        let miss = DataAccessError::member_not_found("memberA");
        assert!(miss.is_not_found());
        assert_eq!(miss.kind(), None);
        assert_eq!(miss.to_string(), "member not found: memberA");
    }
}
