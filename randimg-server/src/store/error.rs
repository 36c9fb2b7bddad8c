//! Error types for the image store module.

use thiserror::Error;

/// Errors that can occur when interacting with the image store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record with the same unique key already exists
    #[error("Field {field} of model {model} should be unique. Value: {value}")]
    UniqueConstraint {
        model: &'static str,
        field: &'static str,
        value: String,
    },

    /// Database connection failed
    #[error("Database connection error: {0}")]
    Connection(String),

    /// Migration execution failed
    #[error("Migration error: {0}")]
    Migration(String),

    /// Any other persistence failure
    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        Self::Database(e.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        Self::Migration(e.to_string())
    }
}
