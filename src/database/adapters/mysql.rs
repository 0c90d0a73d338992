//! MySQL/MariaDB database adapter implementation

use crate::config::DatabaseConfig;
use crate::database::adapter::{DatabaseAdapter, QueryResult};
use crate::database::SqlValue;
use crate::error::{Error, Result};
use crate::models::query_builder::DatabaseBackend;
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::mysql::{MySqlArguments, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column, MySql, Row, TypeInfo, ValueRef};
use std::sync::Arc;
use std::time::Duration;

type MySqlQuery<'q> = sqlx::query::Query<'q, MySql, MySqlArguments>;

/// MySQL database adapter
#[derive(Clone)]
pub struct MySqlAdapter {
    pool: Arc<MySqlPool>,
    backend: DatabaseBackend,
}

impl MySqlAdapter {
    /// Connect using the pool settings from `config`
    ///
    /// `mariadb://` URLs are accepted and rewritten to the MySQL scheme sqlx
    /// expects.
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let (url, backend) = match config.url.strip_prefix("mariadb://") {
            Some(rest) => (format!("mysql://{}", rest), DatabaseBackend::MariaDB),
            None => (config.url.clone(), DatabaseBackend::MySQL),
        };

        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout))
            .idle_timeout(Duration::from_secs(config.idle_timeout))
            .max_lifetime(Duration::from_secs(config.max_lifetime))
            .connect(&url)
            .await
            .map_err(|e| Error::database_connection(format!("Failed to connect to MySQL: {}", e)))?;

        Ok(Self {
            pool: Arc::new(pool),
            backend,
        })
    }

    /// Create adapter from existing pool
    pub fn from_pool(pool: MySqlPool) -> Self {
        Self {
            pool: Arc::new(pool),
            backend: DatabaseBackend::MySQL,
        }
    }

    /// Get reference to the underlying pool
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    fn bind_param(query: MySqlQuery<'_>, value: SqlValue) -> MySqlQuery<'_> {
        match value {
            SqlValue::Null => query.bind(None::<Vec<u8>>),
            SqlValue::Bool(b) => query.bind(b),
            SqlValue::Int(i) => query.bind(i),
            SqlValue::BigInt(i) => query.bind(i),
            SqlValue::Double(f) => query.bind(f),
            SqlValue::String(s) => query.bind(s),
            SqlValue::Bytes(b) => query.bind(b),
        }
    }

    fn bind_all(sql: &str, params: Vec<SqlValue>) -> MySqlQuery<'_> {
        params.into_iter().fold(sqlx::query(sql), Self::bind_param)
    }

    fn extract_value(row: &MySqlRow, index: usize, type_name: &str) -> Result<SqlValue> {
        let is_null = row
            .try_get_raw(index)
            .map(|raw| raw.is_null())
            .map_err(|e| Error::database_query(format!("MySQL column read failed: {}", e)))?;
        if is_null {
            return Ok(SqlValue::Null);
        }

        let decoded = match type_name {
            "BOOLEAN" => row.try_get::<bool, _>(index).map(SqlValue::Bool),
            "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" => {
                row.try_get::<i32, _>(index).map(SqlValue::Int)
            }
            "BIGINT" => row.try_get::<i64, _>(index).map(SqlValue::BigInt),
            "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED" => row
                .try_get::<u32, _>(index)
                .map(|v| SqlValue::BigInt(v.into())),
            "BIGINT UNSIGNED" => {
                let value = row.try_get::<u64, _>(index).map_err(|e| {
                    Error::database_query(format!(
                        "MySQL column decode failed for type {}: {}",
                        type_name, e
                    ))
                })?;
                return Self::unsigned_to_bigint(value);
            }
            "FLOAT" => row.try_get::<f32, _>(index).map(|v| SqlValue::Double(v.into())),
            "DOUBLE" => row.try_get::<f64, _>(index).map(SqlValue::Double),
            "BINARY" | "VARBINARY" | "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" => {
                row.try_get::<Vec<u8>, _>(index).map(SqlValue::Bytes)
            }
            _ => row.try_get::<String, _>(index).map(SqlValue::String),
        };

        decoded.map_err(|e| {
            Error::database_query(format!(
                "MySQL column decode failed for type {}: {}",
                type_name, e
            ))
        })
    }

    fn unsigned_to_bigint(value: u64) -> Result<SqlValue> {
        i64::try_from(value).map(SqlValue::BigInt).map_err(|_| {
            Error::database_query(format!(
                "MySQL BIGINT UNSIGNED value {} does not fit in a signed 64-bit integer",
                value
            ))
        })
    }

    /// Convert a MySQL row to a JSON object keyed by column name
    fn row_to_json(row: &MySqlRow) -> Result<JsonValue> {
        let mut obj = serde_json::Map::new();
        for (i, column) in row.columns().iter().enumerate() {
            let value = Self::extract_value(row, i, column.type_info().name())?;
            obj.insert(column.name().to_string(), value.to_json());
        }
        Ok(JsonValue::Object(obj))
    }
}

#[async_trait]
impl DatabaseAdapter for MySqlAdapter {
    fn backend(&self) -> DatabaseBackend {
        self.backend
    }

    async fn execute(&self, sql: &str, params: Vec<SqlValue>) -> Result<QueryResult> {
        #[cfg(debug_assertions)]
        {
            log::debug!("MySQL EXECUTE: {}", sql);
            log::debug!("  Parameters: {:?}", params);
        }

        let result = Self::bind_all(sql, params)
            .execute(&*self.pool)
            .await
            .map_err(|e| Error::database_query(format!("MySQL execute failed: {}", e)))?;

        Ok(QueryResult {
            rows_affected: result.rows_affected(),
            last_insert_id: Some(result.last_insert_id() as i64),
        })
    }

    async fn fetch_all(&self, sql: &str, params: Vec<SqlValue>) -> Result<Vec<JsonValue>> {
        #[cfg(debug_assertions)]
        {
            log::debug!("MySQL FETCH_ALL: {}", sql);
            log::debug!("  Parameters: {:?}", params);
        }

        let rows = Self::bind_all(sql, params)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| Error::database_query(format!("MySQL fetch_all failed: {}", e)))?;

        rows.iter().map(Self::row_to_json).collect()
    }

    async fn fetch_one(&self, sql: &str, params: Vec<SqlValue>) -> Result<Option<JsonValue>> {
        #[cfg(debug_assertions)]
        {
            log::debug!("MySQL FETCH_ONE: {}", sql);
            log::debug!("  Parameters: {:?}", params);
        }

        let row = Self::bind_all(sql, params)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| Error::database_query(format!("MySQL fetch_one failed: {}", e)))?;

        row.as_ref().map(Self::row_to_json).transpose()
    }

    async fn ping(&self) -> Result<bool> {
        sqlx::query("SELECT 1")
            .fetch_one(&*self.pool)
            .await
            .map(|_| true)
            .map_err(|e| Error::database_connection(format!("MySQL ping failed: {}", e)))
    }
}
