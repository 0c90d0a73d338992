//! Database adapter trait for multi-database support
//!
//! This module provides a unified interface for the database backends the
//! user model can run against.

use crate::database::SqlValue;
use crate::error::Result;
use crate::models::query_builder::{DatabaseBackend, QueryBuilder};
use async_trait::async_trait;
use serde_json::Value as JsonValue;

/// Result type for database query operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryResult {
    /// Number of rows affected by the query
    pub rows_affected: u64,
    /// Last inserted ID (if the backend reports one)
    pub last_insert_id: Option<i64>,
}

/// Unified database adapter trait
///
/// Rows come back as JSON objects keyed by column name, which the models
/// deserialize into their own record types.
#[async_trait]
pub trait DatabaseAdapter: Send + Sync {
    /// Get the database backend type
    fn backend(&self) -> DatabaseBackend;

    /// Execute a query that modifies data (INSERT, UPDATE, DELETE, DDL)
    ///
    /// # Returns
    /// * `Ok(QueryResult)` - Result with affected rows and last insert ID
    /// * `Err(Error)` - If the query fails
    async fn execute(&self, sql: &str, params: Vec<SqlValue>) -> Result<QueryResult>;

    /// Fetch all rows from a SELECT query
    async fn fetch_all(&self, sql: &str, params: Vec<SqlValue>) -> Result<Vec<JsonValue>>;

    /// Fetch a single row from a SELECT query
    ///
    /// # Returns
    /// * `Ok(Some(JsonValue))` - The first matching row
    /// * `Ok(None)` - If no rows match
    /// * `Err(Error)` - If the query fails
    async fn fetch_one(&self, sql: &str, params: Vec<SqlValue>) -> Result<Option<JsonValue>>;

    /// Test database connectivity
    async fn ping(&self) -> Result<bool>;

    /// Create a new query builder for this database's SQL dialect
    fn query(&self) -> QueryBuilder {
        QueryBuilder::new(self.backend())
    }
}
