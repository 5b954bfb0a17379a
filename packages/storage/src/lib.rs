// ABOUTME: Data layer and persistence for Tasklane
// ABOUTME: Storage error type, SQLite pool bootstrap and embedded migrations

use thiserror::Error;

pub mod db;

pub use db::{connect, connect_in_memory};

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Record not found")]
    NotFound,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl StorageError {
    /// Map a sqlx error, turning unique-constraint violations into `Conflict`
    pub fn from_write(err: sqlx::Error, conflict_message: impl Into<String>) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StorageError::Conflict(conflict_message.into())
            }
            _ => StorageError::Sqlx(err),
        }
    }

    /// Map `RowNotFound` to `NotFound`, everything else to `Sqlx`
    pub fn from_read(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StorageError::NotFound,
            other => StorageError::Sqlx(other),
        }
    }
}
