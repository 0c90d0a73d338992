//! SQLite database adapter implementation

use crate::config::DatabaseConfig;
use crate::database::adapter::{DatabaseAdapter, QueryResult};
use crate::database::SqlValue;
use crate::error::{Error, Result};
use crate::models::query_builder::DatabaseBackend;
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::sqlite::{SqliteArguments, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row, Sqlite, TypeInfo, ValueRef};
use std::sync::Arc;
use std::time::Duration;

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// SQLite storage classes (https://www.sqlite.org/datatype3.html)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SqliteAffinity {
    Integer,
    Text,
    Blob,
    Real,
}

impl SqliteAffinity {
    fn from_type_name(type_name: &str) -> Self {
        let upper = type_name.to_uppercase();
        if upper.contains("INT") {
            SqliteAffinity::Integer
        } else if upper.contains("CHAR") || upper.contains("CLOB") || upper.contains("TEXT") {
            SqliteAffinity::Text
        } else if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
            SqliteAffinity::Real
        } else {
            SqliteAffinity::Blob
        }
    }
}

/// SQLite database adapter
#[derive(Clone)]
pub struct SqliteAdapter {
    pool: Arc<SqlitePool>,
}

impl SqliteAdapter {
    /// Connect using the pool settings from `config`
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let pool = Self::pool_options(config)
            .connect(&config.url)
            .await
            .map_err(|e| {
                Error::database_connection(format!("Failed to connect to SQLite: {}", e))
            })?;

        Ok(Self::from_pool(pool))
    }

    /// Pool settings for `config`
    ///
    /// An in-memory database lives and dies with its connection, so
    /// `sqlite::memory:` gets exactly one connection that is never reaped.
    fn pool_options(config: &DatabaseConfig) -> SqlitePoolOptions {
        let options =
            SqlitePoolOptions::new().acquire_timeout(Duration::from_secs(config.connect_timeout));

        if config.url.contains(":memory:") {
            options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            options
                .max_connections(config.max_connections)
                .min_connections(config.min_connections)
                .idle_timeout(Duration::from_secs(config.idle_timeout))
                .max_lifetime(Duration::from_secs(config.max_lifetime))
        }
    }

    /// Create adapter from existing pool
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Get reference to the underlying pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Bind a SqlValue to a SQLite query
    fn bind_param(query: SqliteQuery<'_>, value: SqlValue) -> SqliteQuery<'_> {
        match value {
            SqlValue::Null => query.bind(None::<i32>),
            // SQLite stores bools as integers
            SqlValue::Bool(b) => query.bind(if b { 1i32 } else { 0i32 }),
            SqlValue::Int(i) => query.bind(i),
            SqlValue::BigInt(i) => query.bind(i),
            SqlValue::Double(f) => query.bind(f),
            SqlValue::String(s) => query.bind(s),
            SqlValue::Bytes(b) => query.bind(b),
        }
    }

    fn bind_all(sql: &str, params: Vec<SqlValue>) -> SqliteQuery<'_> {
        params
            .into_iter()
            .fold(sqlx::query(sql), Self::bind_param)
    }

    /// Read one column using the storage class of the stored value
    fn extract_value(row: &SqliteRow, index: usize) -> Result<SqlValue> {
        let affinity = {
            let raw = row
                .try_get_raw(index)
                .map_err(|e| Error::database_query(format!("SQLite column read failed: {}", e)))?;
            if raw.is_null() {
                return Ok(SqlValue::Null);
            }
            SqliteAffinity::from_type_name(raw.type_info().name())
        };

        let decoded = match affinity {
            SqliteAffinity::Integer => row.try_get::<i64, _>(index).map(SqlValue::BigInt),
            SqliteAffinity::Text => row.try_get::<String, _>(index).map(SqlValue::String),
            SqliteAffinity::Real => row.try_get::<f64, _>(index).map(SqlValue::Double),
            SqliteAffinity::Blob => row.try_get::<Vec<u8>, _>(index).map(SqlValue::Bytes),
        };

        decoded.map_err(|e| Error::database_query(format!("SQLite column decode failed: {}", e)))
    }

    /// Convert a SQLite row to a JSON object keyed by column name
    fn row_to_json(row: &SqliteRow) -> Result<JsonValue> {
        let mut obj = serde_json::Map::new();
        for (i, column) in row.columns().iter().enumerate() {
            let value = Self::extract_value(row, i)?;
            obj.insert(column.name().to_string(), value.to_json());
        }
        Ok(JsonValue::Object(obj))
    }
}

#[async_trait]
impl DatabaseAdapter for SqliteAdapter {
    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::SQLite
    }

    async fn execute(&self, sql: &str, params: Vec<SqlValue>) -> Result<QueryResult> {
        // Log SQL in development mode
        #[cfg(debug_assertions)]
        {
            log::debug!("SQLite EXECUTE: {}", sql);
            log::debug!("  Parameters: {:?}", params);
        }

        let result = Self::bind_all(sql, params)
            .execute(&*self.pool)
            .await
            .map_err(|e| Error::database_query(format!("SQLite execute failed: {}", e)))?;

        Ok(QueryResult {
            rows_affected: result.rows_affected(),
            last_insert_id: Some(result.last_insert_rowid()),
        })
    }

    async fn fetch_all(&self, sql: &str, params: Vec<SqlValue>) -> Result<Vec<JsonValue>> {
        #[cfg(debug_assertions)]
        {
            log::debug!("SQLite FETCH_ALL: {}", sql);
            log::debug!("  Parameters: {:?}", params);
        }

        let rows = Self::bind_all(sql, params)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| Error::database_query(format!("SQLite fetch_all failed: {}", e)))?;

        rows.iter().map(Self::row_to_json).collect()
    }

    async fn fetch_one(&self, sql: &str, params: Vec<SqlValue>) -> Result<Option<JsonValue>> {
        #[cfg(debug_assertions)]
        {
            log::debug!("SQLite FETCH_ONE: {}", sql);
            log::debug!("  Parameters: {:?}", params);
        }

        let row = Self::bind_all(sql, params)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| Error::database_query(format!("SQLite fetch_one failed: {}", e)))?;

        row.as_ref().map(Self::row_to_json).transpose()
    }

    async fn ping(&self) -> Result<bool> {
        sqlx::query("SELECT 1")
            .fetch_one(&*self.pool)
            .await
            .map(|_| true)
            .map_err(|e| Error::database_connection(format!("SQLite ping failed: {}", e)))
    }
}
