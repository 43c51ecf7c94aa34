//! Custom error types for the common library
//!
//! Errors raised while opening or querying either of the two databases the
//! application talks to: the remote PostgreSQL document tables and the local
//! SQLite listing cache.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred while opening a connection or pool
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// A transaction could not be started or committed
    #[error("Database transaction error: {0}")]
    Transaction(#[source] SqlxError),

    /// Creating tables failed
    #[error("Database schema error: {0}")]
    Schema(#[source] SqlxError),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;
