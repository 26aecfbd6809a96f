//! Stores and the services built on top of them.
//!
//! Each store is a trait with a SQLite implementation so the services can be
//! exercised against failing doubles in tests.

pub mod blob_store;
pub mod booking_service;
pub mod booking_store;
pub mod identity_resolver;
pub mod identity_store;
pub mod media_service;
pub mod property_store;
pub mod session_store;

use thiserror::Error;

/// Failure of a document-store call.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl StoreError {
    /// A write was refused by a `UNIQUE` constraint.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            StoreError::Sqlx(sqlx::Error::Database(err)) => err.is_unique_violation(),
            _ => false,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
