//! Translation of `sqlx` errors into [`DataAccessError`].
//!
//! Classification looks at the driver-reported [`ErrorKind`] first, then at
//! SQLSTATE (Postgres) or result codes (SQLite), then at the message text.

use sqlx::error::{DatabaseError, ErrorKind};
use std::time::Duration;
use txsync_core::{BoxError, DataAccessError, SqlErrorKind};

/// Direction of the failed statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// `SELECT`
    Read,
    /// `INSERT`, `UPDATE`, `DELETE`, DDL
    Write,
}

// Serialization failure, deadlock, lock not available, admin shutdown,
// SQLITE_BUSY, SQLITE_LOCKED and their extended codes.
const TRANSIENT_CODES: &[&str] = &["40001", "40P01", "55P03", "57P01", "5", "6", "261", "262", "517"];

/// Wrap a statement failure, keeping the operation name, SQL text and root cause.
#[must_use]
pub fn translate(operation: &str, sql: &str, access: Access, error: sqlx::Error) -> DataAccessError {
    let kind = classify(&error);
    tracing::debug!(operation, sql, kind = ?kind, error = %error, "Statement failed");

    let operation = operation.to_string();
    let sql = sql.to_string();
    let source: BoxError = Box::new(error);
    match access {
        Access::Read => DataAccessError::Read {
            operation,
            sql,
            kind,
            source,
        },
        Access::Write => DataAccessError::Write {
            operation,
            sql,
            kind,
            source,
        },
    }
}

/// Map a failure to obtain a connection.
#[must_use]
pub fn translate_acquire(error: sqlx::Error, timeout: Duration) -> DataAccessError {
    match error {
        sqlx::Error::PoolTimedOut => DataAccessError::PoolExhausted { timeout },
        other => DataAccessError::Connection {
            message: "could not open database connection".to_string(),
            source: Some(Box::new(other)),
        },
    }
}

/// Driver-independent classification of a `sqlx` error.
#[must_use]
pub fn classify(error: &sqlx::Error) -> SqlErrorKind {
    match error {
        sqlx::Error::Database(db) => classify_database(db.as_ref()),
        sqlx::Error::Io(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => SqlErrorKind::Transient,
        sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::TypeNotFound { .. } => SqlErrorKind::Decode,
        _ => SqlErrorKind::Other,
    }
}

fn classify_database(db: &dyn DatabaseError) -> SqlErrorKind {
    match db.kind() {
        ErrorKind::UniqueViolation => return SqlErrorKind::DuplicateKey,
        ErrorKind::ForeignKeyViolation | ErrorKind::NotNullViolation | ErrorKind::CheckViolation => {
            return SqlErrorKind::IntegrityViolation;
        }
        _ => {}
    }

    let code = db.code();
    let code = code.as_deref().unwrap_or_default();
    if TRANSIENT_CODES.contains(&code) {
        return SqlErrorKind::Transient;
    }
    // SQLSTATE class 42: syntax error or access rule violation
    if code.len() == 5 && code.starts_with("42") {
        return SqlErrorKind::BadSqlGrammar;
    }

    classify_message(db.message())
}

fn classify_message(message: &str) -> SqlErrorKind {
    let message = message.to_ascii_lowercase();
    if message.contains("unique constraint failed") {
        SqlErrorKind::DuplicateKey
    } else if message.contains("syntax error") || message.contains("no such table") || message.contains("no such column")
    {
        SqlErrorKind::BadSqlGrammar
    } else if message.contains("database is locked") {
        SqlErrorKind::Transient
    } else {
        SqlErrorKind::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_errors_are_transient() {
        let err = sqlx::Error::Io(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset"));
        assert_eq!(classify(&err), SqlErrorKind::Transient);
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(classify(&sqlx::Error::ColumnNotFound("money".into())), SqlErrorKind::Decode);
    }

    #[test]
    fn test_message_fallback() {
        assert_eq!(
            classify_message("UNIQUE constraint failed: member.member_id"),
            SqlErrorKind::DuplicateKey
        );
        assert_eq!(classify_message("near \"selec\": syntax error"), SqlErrorKind::BadSqlGrammar);
        assert_eq!(classify_message("no such table: membr"), SqlErrorKind::BadSqlGrammar);
        assert_eq!(classify_message("database is locked"), SqlErrorKind::Transient);
        assert_eq!(classify_message("disk full"), SqlErrorKind::Other);
    }

    #[test]
    fn test_translate_keeps_context() {
        let err = translate(
            "find_by_id",
            "select member_id, money from member where member_id = $1",
            Access::Read,
            sqlx::Error::RowNotFound,
        );

        match &err {
            DataAccessError::Read { operation, kind, .. } => {
                assert_eq!(operation, "find_by_id");
                assert_eq!(*kind, SqlErrorKind::Other);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.sql(), Some("select member_id, money from member where member_id = $1"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_acquire_timeout_is_pool_exhausted() {
        let err = translate_acquire(sqlx::Error::PoolTimedOut, Duration::from_millis(250));
        assert!(matches!(err, DataAccessError::PoolExhausted { timeout } if timeout == Duration::from_millis(250)));

        let err = translate_acquire(sqlx::Error::PoolClosed, Duration::from_millis(250));
        assert!(matches!(err, DataAccessError::Connection { .. }));
    }
}
