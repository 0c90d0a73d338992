//! usuarios - user data-access model for the `usuarios` table
//!
//! This crate provides the persistence layer of a user-management feature:
//! - CRUD over a single relational table through a dialect-aware query builder
//! - Unique confirmation code issuance with a generate/check/retry loop
//! - Configurable one-way password digests
//! - sqlx adapters for SQLite, PostgreSQL and MySQL

// Error handling lints
#![cfg_attr(
    not(test),
    warn(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
    )
)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used,))]

pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod utils;

// Re-export main types for public API
pub use config::{AppConfig, DatabaseConfig, UsersConfig};
pub use database::{connect, DatabaseAdapter, QueryResult, SqlValue};
pub use error::{Error, Result};
pub use models::code_issuer::{CodeGenerator, RandomCodeGenerator, UniqueCodeIssuer};
pub use models::user::{CodeRow, LookupOutcome, NewUser, UserCredentials, UserRecord, UserUpdate};
pub use models::user_model::UserModel;
pub use utils::crypto::DigestAlgorithm;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::*;
    pub use crate::models::query_builder::{DatabaseBackend, OrderDirection, QueryBuilder};
}
