//! Core query building logic
//!
//! This module contains the database-agnostic query building structures
//! and methods, working with the dialect system for database-specific SQL
//! generation. Non-null values are always bound as parameters.

use super::dialects::{create_dialect, DatabaseBackend, QueryError, SqlDialect};
use crate::database::SqlValue;
use indexmap::IndexMap;

/// Escape character appended to every LIKE predicate
pub const LIKE_ESCAPE: char = '!';

/// Column values for INSERT/UPDATE, kept in insertion order so the generated
/// SQL is stable
pub type ColumnValues = IndexMap<String, SqlValue>;

/// Main query builder that works with any database
pub struct QueryBuilder {
    pub(crate) dialect: Box<dyn SqlDialect>,
    pub(crate) backend: DatabaseBackend,
    pub(crate) table: Option<String>,
    pub(crate) select_columns: Vec<String>,
    pub(crate) where_conditions: Vec<WhereCondition>,
    pub(crate) order_by: Vec<OrderByClause>,
    pub(crate) limit: Option<i64>,
    pub(crate) offset: Option<i64>,
}

#[derive(Clone, Debug)]
pub struct WhereCondition {
    pub column: String,
    pub operator: String,
    pub value: SqlValue,
    pub connector: WhereConnector,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WhereConnector {
    And,
    Or,
}

#[derive(Clone, Debug)]
pub struct OrderByClause {
    pub column: String,
    pub direction: OrderDirection,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

/// Escape LIKE metacharacters so `term` matches literally
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if c == LIKE_ESCAPE || c == '%' || c == '_' {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

/// Pattern matching `term` anywhere in the column (`%term%`)
pub fn like_contains(term: &str) -> String {
    format!("%{}%", escape_like(term))
}

impl QueryBuilder {
    /// Create a new query builder for the specified database backend
    pub fn new(backend: DatabaseBackend) -> Self {
        QueryBuilder {
            dialect: create_dialect(backend),
            backend,
            table: None,
            select_columns: vec!["*".to_string()],
            where_conditions: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    pub fn backend(&self) -> DatabaseBackend {
        self.backend
    }

    /// Set the table to query from
    pub fn from<S: Into<String>>(mut self, table: S) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Set the columns to select
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select_columns = columns.into_iter().map(|s| s.into()).collect();
        if self.select_columns.is_empty() {
            self.select_columns = vec!["*".to_string()];
        }
        self
    }

    fn push_condition(
        mut self,
        column: String,
        operator: &str,
        value: SqlValue,
        connector: WhereConnector,
    ) -> Self {
        self.where_conditions.push(WhereCondition {
            column,
            operator: operator.to_string(),
            value,
            connector,
        });
        self
    }

    /// Add WHERE column = value condition
    pub fn where_eq<S: Into<String>, V: Into<SqlValue>>(self, column: S, value: V) -> Self {
        self.push_condition(column.into(), "=", value.into(), WhereConnector::And)
    }

    /// Add WHERE column LIKE pattern condition
    ///
    /// `!` is the escape character inside `pattern`; build patterns from user
    /// input with [`like_contains`] or [`escape_like`].
    pub fn where_like<S: Into<String>, P: Into<String>>(self, column: S, pattern: P) -> Self {
        self.push_condition(
            column.into(),
            "LIKE",
            SqlValue::String(pattern.into()),
            WhereConnector::And,
        )
    }

    /// OR WHERE column LIKE pattern condition
    pub fn or_where_like<S: Into<String>, P: Into<String>>(self, column: S, pattern: P) -> Self {
        self.push_condition(
            column.into(),
            "LIKE",
            SqlValue::String(pattern.into()),
            WhereConnector::Or,
        )
    }

    /// Add ORDER BY clause
    pub fn order_by<S: Into<String>>(mut self, column: S, direction: OrderDirection) -> Self {
        self.order_by.push(OrderByClause {
            column: column.into(),
            direction,
        });
        self
    }

    /// Add LIMIT clause
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Add OFFSET clause
    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    fn table_name(&self) -> Result<&str, QueryError> {
        self.table
            .as_deref()
            .ok_or_else(|| QueryError::MissingClause {
                clause: "from".to_string(),
            })
    }

    /// Build the SELECT query string with dialect-specific syntax
    pub fn build(&self) -> Result<(String, Vec<SqlValue>), QueryError> {
        let table = self.table_name()?;

        let mut sql = String::from("SELECT ");
        let columns: Vec<String> = self
            .select_columns
            .iter()
            .map(|col| {
                if col == "*" {
                    col.clone()
                } else {
                    self.dialect.quote_identifier(col)
                }
            })
            .collect();
        sql.push_str(&columns.join(", "));

        sql.push_str(" FROM ");
        sql.push_str(&self.dialect.quote_identifier(table));

        let (where_sql, params, _next) = self.build_where_clause(1);
        sql.push_str(&where_sql);

        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            let order_clauses: Vec<String> = self
                .order_by
                .iter()
                .map(|clause| {
                    let direction = match clause.direction {
                        OrderDirection::Asc => "ASC",
                        OrderDirection::Desc => "DESC",
                    };
                    format!(
                        "{} {}",
                        self.dialect.quote_identifier(&clause.column),
                        direction
                    )
                })
                .collect();
            sql.push_str(&order_clauses.join(", "));
        }

        sql.push_str(&self.dialect.limit_syntax(self.limit, self.offset));

        Ok((sql, params))
    }

    /// Returns (sql_expression, should_bind_param)
    fn value_expression(&self, value: &SqlValue, param_index: usize) -> (String, bool) {
        match value {
            SqlValue::Null => ("NULL".to_string(), false),
            _ => (self.dialect.placeholder(param_index), true),
        }
    }

    /// Build WHERE clause
    /// Returns (sql_where_clause, params, next_param_index)
    fn build_where_clause(&self, start_param_index: usize) -> (String, Vec<SqlValue>, usize) {
        if self.where_conditions.is_empty() {
            return (String::new(), Vec::new(), start_param_index);
        }

        let mut sql = String::from(" WHERE ");
        let mut params = Vec::new();
        let mut param_count = start_param_index;

        for (i, condition) in self.where_conditions.iter().enumerate() {
            // The connector of the first condition is ignored
            if i > 0 {
                match condition.connector {
                    WhereConnector::And => sql.push_str(" AND "),
                    WhereConnector::Or => sql.push_str(" OR "),
                }
            }

            let column = self.dialect.quote_identifier(&condition.column);
            if condition.value.is_null() {
                // `= NULL` never matches; compare with IS NULL instead
                sql.push_str(&format!("{} IS NULL", column));
                continue;
            }

            sql.push_str(&format!(
                "{} {} {}",
                column,
                condition.operator,
                self.dialect.placeholder(param_count)
            ));
            if condition.operator == "LIKE" {
                sql.push_str(&format!(" ESCAPE '{}'", LIKE_ESCAPE));
            }
            params.push(condition.value.clone());
            param_count += 1;
        }

        (sql, params, param_count)
    }

    /// Build an INSERT query
    pub fn build_insert(&self, data: &ColumnValues) -> Result<(String, Vec<SqlValue>), QueryError> {
        let table = self.table_name()?;

        if data.is_empty() {
            return Err(QueryError::InvalidSyntax {
                backend: self.backend,
                message: "No data provided for INSERT".to_string(),
            });
        }

        let mut sql = String::from("INSERT INTO ");
        sql.push_str(&self.dialect.quote_identifier(table));

        let columns: Vec<String> = data
            .keys()
            .map(|k| self.dialect.quote_identifier(k))
            .collect();
        sql.push_str(" (");
        sql.push_str(&columns.join(", "));
        sql.push_str(") VALUES (");

        let mut param_index = 1;
        let mut value_parts = Vec::with_capacity(data.len());
        let mut params = Vec::new();

        for value in data.values() {
            let (expression, should_bind) = self.value_expression(value, param_index);
            value_parts.push(expression);

            if should_bind {
                params.push(value.clone());
                param_index += 1;
            }
        }

        sql.push_str(&value_parts.join(", "));
        sql.push(')');

        Ok((sql, params))
    }

    /// Build an UPDATE query
    pub fn build_update(&self, data: &ColumnValues) -> Result<(String, Vec<SqlValue>), QueryError> {
        let table = self.table_name()?;

        if data.is_empty() {
            return Err(QueryError::InvalidSyntax {
                backend: self.backend,
                message: "No data provided for UPDATE".to_string(),
            });
        }

        let mut sql = String::from("UPDATE ");
        sql.push_str(&self.dialect.quote_identifier(table));
        sql.push_str(" SET ");

        let mut params = Vec::new();
        let mut param_count = 1;
        let mut set_clauses = Vec::with_capacity(data.len());

        for (key, value) in data.iter() {
            let (expression, should_bind) = self.value_expression(value, param_count);
            set_clauses.push(format!(
                "{} = {}",
                self.dialect.quote_identifier(key),
                expression
            ));

            if should_bind {
                params.push(value.clone());
                param_count += 1;
            }
        }

        sql.push_str(&set_clauses.join(", "));

        let (where_sql, where_params, _next) = self.build_where_clause(param_count);
        sql.push_str(&where_sql);
        params.extend(where_params);

        Ok((sql, params))
    }

    /// Build a DELETE query
    pub fn build_delete(&self) -> Result<(String, Vec<SqlValue>), QueryError> {
        let table = self.table_name()?;

        let mut sql = String::from("DELETE FROM ");
        sql.push_str(&self.dialect.quote_identifier(table));

        let (where_sql, params, _next) = self.build_where_clause(1);
        sql.push_str(&where_sql);

        Ok((sql, params))
    }
}
