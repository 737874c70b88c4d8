//! Repository Module
//!
//! Free-function CRUD over the SQLite pool. Functions that take a
//! `&mut Transaction` are meant to run inside a caller-owned atomic
//! transaction (the checkout workflow); pool-based functions are
//! single-statement reads/writes.

// Orders
pub mod order;
pub mod payment;

// Marketing
pub mod coupon;
pub mod points;

// Cart
pub mod cart;

use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db) = err
            && db.is_unique_violation()
        {
            return RepoError::Duplicate(err.to_string());
        }
        RepoError::Database(err.to_string())
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Write transaction alias (SQLite)
pub type Tx<'a> = sqlx::Transaction<'a, sqlx::Sqlite>;
