//! Core data models for the venue booking service.
//!
//! Flat records map to SQLite rows via `sqlx::FromRow`; the property profile
//! is assembled from its row by the property store because it embeds JSON
//! columns. Everything serializes as JSON via `serde`.

pub mod booking;
pub mod property;
pub mod session;
pub mod user;
