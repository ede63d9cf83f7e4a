//! Database Error Types
//!
//! Errors raised while opening, initializing or querying the animal store.
//! Business-rule rejections are not represented here; the store reports
//! those as outcome values and the service layer turns them into
//! `TreeServiceError`s.

use std::path::PathBuf;
use thiserror::Error;

/// SQLite primary result code for constraint violations (`SQLITE_CONSTRAINT`).
const SQLITE_CONSTRAINT: i32 = 19;

/// Database operation errors
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish database connection
    #[error("Failed to connect to database at {path}: {source}")]
    ConnectionFailed {
        path: PathBuf,
        source: libsql::Error,
    },

    /// Failed to initialize database schema
    #[error("Failed to initialize database schema: {0}")]
    InitializationFailed(String),

    /// Permission denied when accessing database
    #[error("Permission denied for database path: {path}")]
    PermissionDenied { path: PathBuf },

    /// Failed to create parent directory
    #[error("Failed to create parent directory for database: {0}")]
    DirectoryCreationFailed(#[from] std::io::Error),

    /// libsql operation error
    #[error("Database operation failed: {0}")]
    LibsqlError(#[from] libsql::Error),

    /// SQL execution error with context
    #[error("SQL execution failed: {context}")]
    SqlExecutionError { context: String },
}

impl DatabaseError {
    /// Create a connection failed error
    pub fn connection_failed(path: PathBuf, source: libsql::Error) -> Self {
        Self::ConnectionFailed { path, source }
    }

    /// Create an initialization failed error
    pub fn initialization_failed(msg: impl Into<String>) -> Self {
        Self::InitializationFailed(msg.into())
    }

    /// Create a permission denied error
    pub fn permission_denied(path: PathBuf) -> Self {
        Self::PermissionDenied { path }
    }

    /// Create a SQL execution error with context
    pub fn sql_execution(context: impl Into<String>) -> Self {
        Self::SqlExecutionError {
            context: context.into(),
        }
    }
}

/// Returns true when libsql surfaced a constraint violation.
///
/// Both primary (`19`) and extended codes (`787` for foreign keys) are
/// accepted since the low byte of an extended code is its primary code.
pub(crate) fn is_constraint_violation(err: &libsql::Error) -> bool {
    match err {
        libsql::Error::SqliteFailure(code, message) => {
            (*code & 0xff) == SQLITE_CONSTRAINT || message.contains("FOREIGN KEY constraint")
        }
        other => other.to_string().contains("FOREIGN KEY constraint failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_violation_detection() {
        let fk = libsql::Error::SqliteFailure(787, "FOREIGN KEY constraint failed".to_string());
        assert!(is_constraint_violation(&fk));

        let primary = libsql::Error::SqliteFailure(19, "constraint failed".to_string());
        assert!(is_constraint_violation(&primary));

        let busy = libsql::Error::SqliteFailure(5, "database is locked".to_string());
        assert!(!is_constraint_violation(&busy));
    }

    #[test]
    fn test_error_display() {
        let err = DatabaseError::sql_execution("Failed to insert animal");
        assert_eq!(err.to_string(), "SQL execution failed: Failed to insert animal");
    }
}
