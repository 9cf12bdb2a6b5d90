//! Core error types for the repricer.
//!
//! This module defines database-agnostic error types. Storage-specific errors
//! (from Diesel, SQLite, etc.) are converted to these types by the storage layer.

use thiserror::Error;

use repricer_market_data::errors::MarketDataError;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the repricer.
///
/// Every value reports an [`ErrorKind`] so callers (CLI, HTTP layer) can map
/// failures without inspecting the detail.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Market data operation failed: {0}")]
    MarketData(#[from] MarketDataError),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Auth,
    Upstream,
    Mapping,
    Storage,
    InvalidInput,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Database(DatabaseError::NotFound(_)) => ErrorKind::NotFound,
            Error::Database(_) => ErrorKind::Storage,
            Error::Validation(_) => ErrorKind::InvalidInput,
            Error::MarketData(e) => match e {
                MarketDataError::Auth { .. } | MarketDataError::Unauthorized { .. } => {
                    ErrorKind::Auth
                }
                MarketDataError::Mapping { .. } => ErrorKind::Mapping,
                MarketDataError::Upstream { .. }
                | MarketDataError::Timeout { .. }
                | MarketDataError::Network(_) => ErrorKind::Upstream,
            },
        }
    }

    /// Whether re-running the whole operation later may succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self.kind(),
            ErrorKind::NotFound | ErrorKind::Mapping | ErrorKind::InvalidInput
        )
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Error::Validation(ValidationError::InvalidInput(message.into()))
    }
}

/// Database-agnostic error type for storage operations.
///
/// This enum uses `String` for all error details, allowing the storage layer
/// to convert storage-specific errors (Diesel, SQLite, etc.) into this format.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish a database connection.
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to create or configure the connection pool.
    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(String),

    /// A database query failed to execute.
    #[error("Database query failed: {0}")]
    QueryFailed(String),

    /// The requested record was not found.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A unique constraint was violated (e.g., duplicate key).
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// A foreign key constraint was violated.
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Database migration failed.
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Internal/unexpected database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Validation errors for user input and data parsing.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(Error::NotFound("v".into()).kind(), ErrorKind::NotFound);
        assert_eq!(
            Error::Database(DatabaseError::NotFound("v".into())).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            Error::Database(DatabaseError::QueryFailed("locked".into())).kind(),
            ErrorKind::Storage
        );
        assert_eq!(Error::invalid_input("bad").kind(), ErrorKind::InvalidInput);

        let auth = Error::from(MarketDataError::Auth {
            message: "no creds".into(),
        });
        assert_eq!(auth.kind(), ErrorKind::Auth);

        let upstream = Error::from(MarketDataError::Timeout {
            provider: "STOCKX".into(),
        });
        assert_eq!(upstream.kind(), ErrorKind::Upstream);

        let mapping = Error::from(MarketDataError::Mapping {
            message: "missing edges".into(),
        });
        assert_eq!(mapping.kind(), ErrorKind::Mapping);
    }

    #[test]
    fn test_retryable() {
        assert!(!Error::NotFound("v".into()).is_retryable());
        assert!(!Error::invalid_input("bad").is_retryable());
        assert!(Error::Database(DatabaseError::QueryFailed("busy".into())).is_retryable());
        assert!(Error::from(MarketDataError::Upstream {
            provider: "STOCKX".into(),
            status: Some(502),
            message: "bad gateway".into(),
        })
        .is_retryable());
        assert!(!Error::from(MarketDataError::Mapping {
            message: "x".into()
        })
        .is_retryable());
    }
}
