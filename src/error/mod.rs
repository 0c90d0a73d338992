use thiserror::Error;

use crate::models::query_builder::QueryError;

pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the user model
#[derive(Error, Debug)]
pub enum Error {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "config")]
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Query build error: {0}")]
    Query(#[from] QueryError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // Database-specific errors
    #[error("Database connection error: {0}")]
    DatabaseConnection(String),

    #[error("Database query error: {0}")]
    DatabaseQuery(String),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    // Database error constructors
    pub fn database_connection(msg: impl Into<String>) -> Self {
        Self::DatabaseConnection(msg.into())
    }

    pub fn database_query(msg: impl Into<String>) -> Self {
        Self::DatabaseQuery(msg.into())
    }

    /// True when the error came from the storage layer rather than from
    /// this crate's own checks
    pub fn is_storage_failure(&self) -> bool {
        matches!(
            self,
            Error::DatabaseConnection(_) | Error::DatabaseQuery(_)
        )
    }

    /// Get a stable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Json(_) => "E_JSON",
            #[cfg(feature = "config")]
            Error::Toml(_) => "E_TOML",
            Error::Query(_) => "E_QUERY_BUILD",
            Error::Validation(_) => "E_VALIDATION",
            Error::Config(_) => "E_CONFIG",
            Error::DatabaseConnection(_) => "E_DB_CONNECTION",
            Error::DatabaseQuery(_) => "E_DB_QUERY",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_failure_classification() {
        assert!(Error::database_query("boom").is_storage_failure());
        assert!(Error::database_connection("refused").is_storage_failure());
        assert!(!Error::validation("login is required").is_storage_failure());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::database_query("x").error_code(), "E_DB_QUERY");
        assert_eq!(Error::config("x").error_code(), "E_CONFIG");
        let err: Error = QueryError::MissingClause {
            clause: "from".to_string(),
        }
        .into();
        assert_eq!(err.error_code(), "E_QUERY_BUILD");
    }

    #[test]
    fn test_display_includes_message() {
        let err = Error::validation("login is required");
        assert_eq!(err.to_string(), "Validation error: login is required");
    }
}
