//! PostgreSQL dialect implementation

use super::SqlDialect;

/// PostgreSQL dialect
pub struct PostgresDialect;

impl PostgresDialect {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PostgresDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlDialect for PostgresDialect {
    fn quote_identifier(&self, identifier: &str) -> String {
        // Qualified names (table.column) are passed through
        if identifier.contains('.') {
            identifier.to_string()
        } else {
            format!("\"{}\"", identifier.replace('"', "\"\""))
        }
    }

    fn placeholder(&self, position: usize) -> String {
        format!("${}", position)
    }

    fn limit_syntax(&self, limit: Option<i64>, offset: Option<i64>) -> String {
        let mut sql = String::new();
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        if let Some(offset) = offset {
            sql.push_str(&format!(" OFFSET {}", offset));
        }
        sql
    }

    fn auto_increment_syntax(&self) -> &'static str {
        "BIGSERIAL PRIMARY KEY"
    }
}
