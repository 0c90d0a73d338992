//! Multi-database query builder
//!
//! Provides a unified interface for building SQL across PostgreSQL, MySQL
//! and SQLite while handling dialect differences (identifier quoting,
//! placeholders, LIMIT syntax, auto-increment keys).
//!
//! - dialects/: Database-specific SQL generation
//! - core.rs: SELECT / INSERT / UPDATE / DELETE building
//! - schema.rs: CREATE TABLE building

pub mod core;
pub mod dialects;
pub mod schema;

pub use self::core::{
    escape_like, like_contains, ColumnValues, OrderByClause, OrderDirection, QueryBuilder,
    WhereCondition, WhereConnector, LIKE_ESCAPE,
};
pub use dialects::{DatabaseBackend, QueryError, SqlDialect};
pub use dialects::{MySQLDialect, PostgresDialect, SQLiteDialect};
pub use schema::{CreateTableBuilder, SchemaBuilder};

pub use crate::database::SqlValue;
