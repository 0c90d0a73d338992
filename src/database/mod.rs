//! Database access for the models
//!
//! Provides the adapter trait, the sqlx-backed adapters for each supported
//! backend, the shared `SqlValue` type, and a `connect` factory that picks
//! the adapter from the connection URL.

pub mod adapter;
pub mod adapters;
pub mod types;

use std::sync::Arc;

use crate::config::DatabaseConfig;
use crate::error::{Error, Result};
use crate::models::query_builder::DatabaseBackend;

// Re-export main types for convenience
pub use adapter::{DatabaseAdapter, QueryResult};
pub use adapters::{MySqlAdapter, PostgresAdapter, SqliteAdapter};
pub use types::SqlValue;

/// Open a connection pool for `config.url` and wrap it in the matching adapter
pub async fn connect(config: &DatabaseConfig) -> Result<Arc<dyn DatabaseAdapter>> {
    let backend = DatabaseBackend::from_url(&config.url).ok_or_else(|| {
        Error::config(format!(
            "Unsupported database URL '{}'. Expected sqlite:, postgres://, postgresql://, mysql:// or mariadb://",
            config.url
        ))
    })?;

    let adapter: Arc<dyn DatabaseAdapter> = match backend {
        DatabaseBackend::SQLite => Arc::new(SqliteAdapter::new(config).await?),
        DatabaseBackend::Postgres => Arc::new(PostgresAdapter::new(config).await?),
        DatabaseBackend::MySQL | DatabaseBackend::MariaDB => {
            Arc::new(MySqlAdapter::new(config).await?)
        }
    };

    log::info!(
        "Connected to {:?} database (max {} connections)",
        adapter.backend(),
        config.max_connections
    );

    Ok(adapter)
}
