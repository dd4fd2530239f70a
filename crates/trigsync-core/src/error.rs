//! Error types

use miette::Diagnostic;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T, E = DumpError> = std::result::Result<T, E>;

/// Hard failures of a dump pass.
///
/// Mismatched or missing triggers are never errors; they end up as comments
/// in the generated output. Only resource-level problems land here.
#[derive(Debug, Error, Diagnostic)]
pub enum DumpError {
    /// A database call made through the connection failed
    #[error("database error while {operation}: {message}")]
    #[diagnostic(
        code(trigsync::database),
        help("check that the database connection is available")
    )]
    Database { operation: String, message: String },

    /// Transaction scope misuse (e.g. rollback with no open transaction)
    #[error("transaction error: {message}")]
    #[diagnostic(code(trigsync::transaction))]
    Transaction { message: String },

    /// The migration source could not produce its builders
    #[error("could not load migrations: {message}")]
    #[diagnostic(code(trigsync::migrations))]
    Migrations { message: String },

    /// Writing to the output sink failed
    #[error(transparent)]
    #[diagnostic(code(trigsync::io))]
    Io(#[from] std::io::Error),
}

impl DumpError {
    pub fn database(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Database {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn transaction(message: impl Into<String>) -> Self {
        Self::Transaction {
            message: message.into(),
        }
    }

    pub fn migrations(message: impl Into<String>) -> Self {
        Self::Migrations {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(err: &DumpError) -> String {
        err.code().map(|c| c.to_string()).unwrap_or_default()
    }

    #[test]
    fn test_database_error_names_operation() {
        let err = DumpError::database("listing triggers", "connection refused");
        assert_eq!(
            err.to_string(),
            "database error while listing triggers: connection refused"
        );
        assert_eq!(code(&err), "trigsync::database");
    }

    #[test]
    fn test_io_error_is_transparent() {
        let err: DumpError = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe").into();
        assert_eq!(err.to_string(), "pipe");
        assert_eq!(code(&err), "trigsync::io");
    }
}
