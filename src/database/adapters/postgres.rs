//! PostgreSQL database adapter implementation

use crate::config::DatabaseConfig;
use crate::database::adapter::{DatabaseAdapter, QueryResult};
use crate::database::SqlValue;
use crate::error::{Error, Result};
use crate::models::query_builder::DatabaseBackend;
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgArguments, PgPool, PgPoolOptions, PgRow};
use sqlx::{Column, Postgres, Row, TypeInfo, ValueRef};
use std::sync::Arc;
use std::time::Duration;

type PgQuery<'q> = sqlx::query::Query<'q, Postgres, PgArguments>;

/// PostgreSQL database adapter
#[derive(Clone)]
pub struct PostgresAdapter {
    pool: Arc<PgPool>,
}

impl PostgresAdapter {
    /// Connect using the pool settings from `config`
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout))
            .idle_timeout(Duration::from_secs(config.idle_timeout))
            .max_lifetime(Duration::from_secs(config.max_lifetime))
            .connect(&config.url)
            .await
            .map_err(|e| {
                Error::database_connection(format!("Failed to connect to PostgreSQL: {}", e))
            })?;

        Ok(Self::from_pool(pool))
    }

    /// Create adapter from existing pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Get reference to the underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn bind_param(query: PgQuery<'_>, value: SqlValue) -> PgQuery<'_> {
        match value {
            SqlValue::Null => query.bind(None::<String>),
            SqlValue::Bool(b) => query.bind(b),
            SqlValue::Int(i) => query.bind(i),
            SqlValue::BigInt(i) => query.bind(i),
            SqlValue::Double(f) => query.bind(f),
            SqlValue::String(s) => query.bind(s),
            SqlValue::Bytes(b) => query.bind(b),
        }
    }

    fn bind_all(sql: &str, params: Vec<SqlValue>) -> PgQuery<'_> {
        params.into_iter().fold(sqlx::query(sql), Self::bind_param)
    }

    fn extract_value(row: &PgRow, index: usize, type_name: &str) -> Result<SqlValue> {
        let is_null = row
            .try_get_raw(index)
            .map(|raw| raw.is_null())
            .map_err(|e| Error::database_query(format!("PostgreSQL column read failed: {}", e)))?;
        if is_null {
            return Ok(SqlValue::Null);
        }

        let decoded = match type_name {
            "BOOL" => row.try_get::<bool, _>(index).map(SqlValue::Bool),
            "INT2" => row.try_get::<i16, _>(index).map(|v| SqlValue::Int(v.into())),
            "INT4" => row.try_get::<i32, _>(index).map(SqlValue::Int),
            "INT8" => row.try_get::<i64, _>(index).map(SqlValue::BigInt),
            "FLOAT4" => row.try_get::<f32, _>(index).map(|v| SqlValue::Double(v.into())),
            "FLOAT8" => row.try_get::<f64, _>(index).map(SqlValue::Double),
            "BYTEA" => row.try_get::<Vec<u8>, _>(index).map(SqlValue::Bytes),
            // TEXT, VARCHAR, BPCHAR, NAME and anything textual
            _ => row.try_get::<String, _>(index).map(SqlValue::String),
        };

        decoded.map_err(|e| {
            Error::database_query(format!(
                "PostgreSQL column decode failed for type {}: {}",
                type_name, e
            ))
        })
    }

    /// Convert a PostgreSQL row to a JSON object keyed by column name
    fn row_to_json(row: &PgRow) -> Result<JsonValue> {
        let mut obj = serde_json::Map::new();
        for (i, column) in row.columns().iter().enumerate() {
            let value = Self::extract_value(row, i, column.type_info().name())?;
            obj.insert(column.name().to_string(), value.to_json());
        }
        Ok(JsonValue::Object(obj))
    }
}

#[async_trait]
impl DatabaseAdapter for PostgresAdapter {
    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::Postgres
    }

    async fn execute(&self, sql: &str, params: Vec<SqlValue>) -> Result<QueryResult> {
        #[cfg(debug_assertions)]
        {
            log::debug!("PostgreSQL EXECUTE: {}", sql);
            log::debug!("  Parameters: {:?}", params);
        }

        let result = Self::bind_all(sql, params)
            .execute(&*self.pool)
            .await
            .map_err(|e| Error::database_query(format!("PostgreSQL execute failed: {}", e)))?;

        Ok(QueryResult {
            rows_affected: result.rows_affected(),
            // PostgreSQL needs RETURNING for generated keys
            last_insert_id: None,
        })
    }

    async fn fetch_all(&self, sql: &str, params: Vec<SqlValue>) -> Result<Vec<JsonValue>> {
        #[cfg(debug_assertions)]
        {
            log::debug!("PostgreSQL FETCH_ALL: {}", sql);
            log::debug!("  Parameters: {:?}", params);
        }

        let rows = Self::bind_all(sql, params)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| Error::database_query(format!("PostgreSQL fetch_all failed: {}", e)))?;

        rows.iter().map(Self::row_to_json).collect()
    }

    async fn fetch_one(&self, sql: &str, params: Vec<SqlValue>) -> Result<Option<JsonValue>> {
        #[cfg(debug_assertions)]
        {
            log::debug!("PostgreSQL FETCH_ONE: {}", sql);
            log::debug!("  Parameters: {:?}", params);
        }

        let row = Self::bind_all(sql, params)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| Error::database_query(format!("PostgreSQL fetch_one failed: {}", e)))?;

        row.as_ref().map(Self::row_to_json).transpose()
    }

    async fn ping(&self) -> Result<bool> {
        sqlx::query("SELECT 1")
            .fetch_one(&*self.pool)
            .await
            .map(|_| true)
            .map_err(|e| Error::database_connection(format!("PostgreSQL ping failed: {}", e)))
    }
}
