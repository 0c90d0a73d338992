//! SQLite dialect implementation

use super::SqlDialect;

/// SQLite dialect
pub struct SQLiteDialect;

impl SQLiteDialect {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SQLiteDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlDialect for SQLiteDialect {
    fn quote_identifier(&self, identifier: &str) -> String {
        if identifier.contains('.') {
            identifier.to_string()
        } else {
            format!("\"{}\"", identifier.replace('"', "\"\""))
        }
    }

    fn placeholder(&self, _position: usize) -> String {
        "?".to_string()
    }

    fn limit_syntax(&self, limit: Option<i64>, offset: Option<i64>) -> String {
        match (limit, offset) {
            (Some(limit), Some(offset)) => format!(" LIMIT {} OFFSET {}", limit, offset),
            (Some(limit), None) => format!(" LIMIT {}", limit),
            (None, Some(offset)) => format!(" LIMIT -1 OFFSET {}", offset),
            (None, None) => String::new(),
        }
    }

    fn auto_increment_syntax(&self) -> &'static str {
        "INTEGER PRIMARY KEY AUTOINCREMENT"
    }

    fn varchar_type(&self, _max_length: usize) -> String {
        "TEXT".to_string()
    }
}
