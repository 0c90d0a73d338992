//! MySQL/MariaDB dialect implementation

use super::SqlDialect;

/// MySQL/MariaDB dialect
pub struct MySQLDialect;

impl MySQLDialect {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MySQLDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlDialect for MySQLDialect {
    fn quote_identifier(&self, identifier: &str) -> String {
        if identifier.contains('.') {
            identifier.to_string()
        } else {
            format!("`{}`", identifier.replace('`', "``"))
        }
    }

    fn placeholder(&self, _position: usize) -> String {
        "?".to_string()
    }

    fn limit_syntax(&self, limit: Option<i64>, offset: Option<i64>) -> String {
        match (limit, offset) {
            (Some(limit), Some(offset)) => format!(" LIMIT {} OFFSET {}", limit, offset),
            (Some(limit), None) => format!(" LIMIT {}", limit),
            // MySQL has no OFFSET without LIMIT
            (None, Some(offset)) => format!(" LIMIT 18446744073709551615 OFFSET {}", offset),
            (None, None) => String::new(),
        }
    }

    fn auto_increment_syntax(&self) -> &'static str {
        "BIGINT AUTO_INCREMENT PRIMARY KEY"
    }
}
