//! Schema building for the query builder
//!
//! Generates dialect-specific DDL for the tables the models own.

use super::dialects::{create_dialect, DatabaseBackend, SqlDialect};

/// Schema builder that generates dialect-specific DDL
pub struct SchemaBuilder {
    dialect: Box<dyn SqlDialect>,
}

impl SchemaBuilder {
    pub fn new(backend: DatabaseBackend) -> Self {
        SchemaBuilder {
            dialect: create_dialect(backend),
        }
    }

    /// Create a CREATE TABLE statement
    pub fn create_table(&self, table_name: &str) -> CreateTableBuilder<'_> {
        CreateTableBuilder {
            dialect: self.dialect.as_ref(),
            table_name: table_name.to_string(),
            if_not_exists: false,
            columns: Vec::new(),
        }
    }
}

pub struct CreateTableBuilder<'a> {
    dialect: &'a dyn SqlDialect,
    table_name: String,
    if_not_exists: bool,
    columns: Vec<ColumnDefinition>,
}

#[derive(Clone)]
struct ColumnDefinition {
    name: String,
    data_type: String,
    nullable: bool,
    unique: bool,
}

impl<'a> CreateTableBuilder<'a> {
    /// Emit `CREATE TABLE IF NOT EXISTS`
    pub fn if_not_exists(mut self, enabled: bool) -> Self {
        self.if_not_exists = enabled;
        self
    }

    /// Add an auto-incrementing ID column
    pub fn id(mut self) -> Self {
        self.columns.push(ColumnDefinition {
            name: "id".to_string(),
            data_type: self.dialect.auto_increment_syntax().to_string(),
            nullable: true,
            unique: false,
        });
        self
    }

    /// Add a string column (nullable until `.required()`)
    pub fn string(mut self, name: &str, max_length: usize) -> Self {
        self.columns.push(ColumnDefinition {
            name: name.to_string(),
            data_type: self.dialect.varchar_type(max_length),
            nullable: true,
            unique: false,
        });
        self
    }

    /// Mark the last added column NOT NULL
    pub fn required(mut self) -> Self {
        if let Some(column) = self.columns.last_mut() {
            column.nullable = false;
        }
        self
    }

    /// Mark the last added column UNIQUE when `enabled`
    pub fn unique(mut self, enabled: bool) -> Self {
        if let Some(column) = self.columns.last_mut() {
            column.unique = enabled;
        }
        self
    }

    /// Build the CREATE TABLE statement
    pub fn build(&self) -> String {
        let mut sql = String::from("CREATE TABLE ");
        if self.if_not_exists {
            sql.push_str("IF NOT EXISTS ");
        }
        sql.push_str(&self.dialect.quote_identifier(&self.table_name));
        sql.push_str(" (\n");

        let column_defs: Vec<String> = self
            .columns
            .iter()
            .map(|col| {
                let mut def = format!(
                    "  {} {}",
                    self.dialect.quote_identifier(&col.name),
                    col.data_type
                );
                if !col.nullable {
                    def.push_str(" NOT NULL");
                }
                if col.unique {
                    def.push_str(" UNIQUE");
                }
                def
            })
            .collect();

        sql.push_str(&column_defs.join(",\n"));
        sql.push_str("\n)");
        sql
    }
}
