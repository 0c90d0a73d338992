//! Database dialect implementations for the query builder
//!
//! This module contains database-specific SQL generation logic, separated
//! by database type.

/// Database backend types supported by the adapters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseBackend {
    Postgres,
    MySQL,
    MariaDB,
    SQLite,
}

impl DatabaseBackend {
    /// Detect the backend from a connection URL scheme
    pub fn from_url(url: &str) -> Option<Self> {
        if url.starts_with("postgresql://") || url.starts_with("postgres://") {
            Some(DatabaseBackend::Postgres)
        } else if url.starts_with("mysql://") {
            Some(DatabaseBackend::MySQL)
        } else if url.starts_with("mariadb://") {
            Some(DatabaseBackend::MariaDB)
        } else if url.starts_with("sqlite:") {
            Some(DatabaseBackend::SQLite)
        } else {
            None
        }
    }
}

/// Unified error type for query building
#[derive(thiserror::Error, Debug)]
pub enum QueryError {
    #[error("Missing required clause: {clause}. Add .{clause}() to your query.")]
    MissingClause { clause: String },

    #[error("Invalid syntax for {backend:?}: {message}")]
    InvalidSyntax {
        backend: DatabaseBackend,
        message: String,
    },
}

/// Trait for database-specific SQL generation
pub trait SqlDialect: Send + Sync {
    /// Quote an identifier (table name, column name) for this database
    fn quote_identifier(&self, identifier: &str) -> String;

    /// Generate a parameter placeholder for the given position
    fn placeholder(&self, position: usize) -> String;

    /// Generate LIMIT/OFFSET syntax for this database
    fn limit_syntax(&self, limit: Option<i64>, offset: Option<i64>) -> String;

    /// Get the auto-increment primary key column syntax for this database
    fn auto_increment_syntax(&self) -> &'static str;

    /// Column type for a bounded string
    fn varchar_type(&self, max_length: usize) -> String {
        format!("VARCHAR({})", max_length)
    }
}

pub mod mysql;
pub mod postgres;
pub mod sqlite;

pub use mysql::MySQLDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SQLiteDialect;

/// Factory function to create the appropriate dialect for a database backend
pub fn create_dialect(backend: DatabaseBackend) -> Box<dyn SqlDialect> {
    match backend {
        DatabaseBackend::Postgres => Box::new(PostgresDialect::new()),
        DatabaseBackend::MySQL | DatabaseBackend::MariaDB => Box::new(MySQLDialect::new()),
        DatabaseBackend::SQLite => Box::new(SQLiteDialect::new()),
    }
}
