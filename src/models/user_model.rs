//! Data access for the `usuarios` table
//!
//! `UserModel` owns every query against the table. It builds SQL through the
//! adapter's dialect-aware [`QueryBuilder`], hands rows back as typed records
//! and delegates confirmation code uniqueness to a [`UniqueCodeIssuer`].
//!
//! # Example
//! ```rust,ignore
//! let adapter = usuarios::connect(&config.database).await?;
//! let users = UserModel::new(adapter, config.users.clone());
//! users.create_table(true).await?;
//! users.create_user(NewUser::new("Ana", "555", "ana@example.com", "ana", "secret")).await?;
//! ```

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::config::UsersConfig;
use crate::database::DatabaseAdapter;
use crate::error::{Error, Result};
use crate::models::code_issuer::{
    CodeGenerator, RandomCodeGenerator, UniqueCodeIssuer, CODE_LENGTH,
};
use crate::models::query_builder::{
    like_contains, ColumnValues, OrderDirection, QueryBuilder, SchemaBuilder, SqlValue,
};
use crate::models::user::{
    CodeRow, LookupOutcome, NewUser, UserCredentials, UserRecord, UserUpdate,
};
use crate::utils::crypto;

/// Data-access model for user records
pub struct UserModel {
    adapter: Arc<dyn DatabaseAdapter>,
    config: UsersConfig,
    issuer: UniqueCodeIssuer<Box<dyn CodeGenerator>>,
}

impl UserModel {
    /// Model with an entropy-seeded code generator
    pub fn new(adapter: Arc<dyn DatabaseAdapter>, config: UsersConfig) -> Self {
        Self::with_generator(adapter, config, RandomCodeGenerator::new())
    }

    /// Model with a caller-supplied code generator
    pub fn with_generator<G>(
        adapter: Arc<dyn DatabaseAdapter>,
        config: UsersConfig,
        generator: G,
    ) -> Self
    where
        G: CodeGenerator + 'static,
    {
        let generator: Box<dyn CodeGenerator> = Box::new(generator);
        Self {
            adapter,
            config,
            issuer: UniqueCodeIssuer::new(generator),
        }
    }

    pub fn config(&self) -> &UsersConfig {
        &self.config
    }

    pub fn adapter(&self) -> &Arc<dyn DatabaseAdapter> {
        &self.adapter
    }

    fn table(&self) -> QueryBuilder {
        self.adapter.query().from(self.config.table.as_str())
    }

    fn digest_password(&self, password: &str) -> String {
        crypto::digest(self.config.password_digest, password)
    }

    async fn fetch_first<T: DeserializeOwned>(&self, query: QueryBuilder) -> Result<Option<T>> {
        let (sql, params) = query.build()?;
        match self.adapter.fetch_one(&sql, params).await? {
            Some(row) => Ok(Some(serde_json::from_value(row)?)),
            None => Ok(None),
        }
    }

    async fn fetch_rows<T: DeserializeOwned>(&self, query: QueryBuilder) -> Result<Vec<T>> {
        let (sql, params) = query.build()?;
        self.adapter
            .fetch_all(&sql, params)
            .await?
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(Error::from))
            .collect()
    }

    fn search_query(&self, term: &str) -> QueryBuilder {
        let pattern = like_contains(term);
        self.table()
            .where_like("login", pattern.as_str())
            .or_where_like("nombre", pattern)
            .order_by("id", OrderDirection::Asc)
    }

    /// A fresh candidate code, not checked against storage
    pub fn generate_code(&self) -> String {
        self.issuer.generate_candidate()
    }

    /// The user with the given id
    pub async fn get_user_by_id(&self, id: i64) -> Result<Option<UserRecord>> {
        self.fetch_first(self.table().where_eq("id", id).limit(1)).await
    }

    /// Match a login and a plaintext password against the stored digest
    pub async fn get_user(
        &self,
        login: &str,
        password: &str,
    ) -> Result<LookupOutcome<UserRecord>> {
        let query = self
            .table()
            .where_eq("login", login)
            .where_eq("pass", self.digest_password(password))
            .limit(1);

        Ok(match self.fetch_first(query).await? {
            Some(user) => LookupOutcome::Found(user),
            None => LookupOutcome::Invalid,
        })
    }

    /// Check a plaintext password against a loaded record's digest
    pub fn verify_password(&self, user: &UserRecord, password: &str) -> bool {
        crypto::constant_time_compare(&self.digest_password(password), &user.password_digest)
    }

    /// Login, password digest and code of the user registered with `email`
    pub async fn get_credentials_by_email(&self, email: &str) -> Result<Option<UserCredentials>> {
        let query = self
            .table()
            .select(["id", "login", "pass", "code"])
            .where_eq("correo", email)
            .limit(1);
        self.fetch_first(query).await
    }

    /// First user whose login or display name contains `term`
    pub async fn search_by_login(&self, term: &str) -> Result<LookupOutcome<UserRecord>> {
        Ok(match self.fetch_first(self.search_query(term).limit(1)).await? {
            Some(user) => LookupOutcome::Found(user),
            None => LookupOutcome::NotFound,
        })
    }

    /// Every user whose login or display name contains `term`, by id
    pub async fn search_users(&self, term: &str) -> Result<Vec<UserRecord>> {
        self.fetch_rows(self.search_query(term)).await
    }

    /// Look up a confirmation code, optionally restricted to one user
    pub async fn get_code(&self, code: &str, id: Option<i64>) -> Result<Option<CodeRow>> {
        let mut query = self.table().select(["code"]).where_eq("code", code);
        if let Some(id) = id {
            query = query.where_eq("id", id);
        }
        self.fetch_first(query.limit(1)).await
    }

    /// A code no stored user held at check time
    pub async fn issue_code(&self) -> Result<String> {
        self.issuer
            .issue_unique_code(|candidate| async move { self.get_code(&candidate, None).await })
            .await
    }

    /// Validate, issue a code and insert the user
    pub async fn create_user(&self, user: NewUser) -> Result<bool> {
        user.validate()?;
        let code = self.issue_code().await?;
        self.insert_user(&user, &code).await
    }

    /// Insert `user` with an already issued confirmation code
    pub async fn insert_user(&self, user: &NewUser, code: &str) -> Result<bool> {
        let role = user
            .role
            .clone()
            .unwrap_or_else(|| self.config.default_role.clone());

        let mut data = ColumnValues::new();
        data.insert("nombre".to_string(), SqlValue::from(&user.display_name));
        data.insert("login".to_string(), SqlValue::from(&user.login));
        data.insert(
            "pass".to_string(),
            SqlValue::from(self.digest_password(&user.password)),
        );
        data.insert("correo".to_string(), SqlValue::from(&user.email));
        data.insert("telefono".to_string(), SqlValue::from(&user.phone));
        data.insert("perfil".to_string(), SqlValue::from(role));
        data.insert("code".to_string(), SqlValue::from(code));

        let (sql, params) = self.table().build_insert(&data)?;
        let result = self.adapter.execute(&sql, params).await?;

        log::debug!("Inserted user '{}'", user.login);
        Ok(result.rows_affected == 1)
    }

    /// Update profile fields; the role only when `changes.role` is non-blank
    pub async fn update_user(&self, id: i64, changes: UserUpdate) -> Result<bool> {
        let mut data = ColumnValues::new();
        data.insert("nombre".to_string(), SqlValue::from(changes.display_name));
        data.insert("login".to_string(), SqlValue::from(changes.login));
        data.insert("correo".to_string(), SqlValue::from(changes.email));
        data.insert("telefono".to_string(), SqlValue::from(changes.phone));
        if let Some(role) = changes.role.filter(|r| !r.trim().is_empty()) {
            data.insert("perfil".to_string(), SqlValue::from(role));
        }

        let (sql, params) = self.table().where_eq("id", id).build_update(&data)?;
        let result = self.adapter.execute(&sql, params).await?;
        Ok(result.rows_affected > 0)
    }

    /// Store the digest of a new password
    pub async fn update_password(&self, id: i64, password: &str) -> Result<bool> {
        let mut data = ColumnValues::new();
        data.insert(
            "pass".to_string(),
            SqlValue::from(self.digest_password(password)),
        );

        let (sql, params) = self.table().where_eq("id", id).build_update(&data)?;
        let result = self.adapter.execute(&sql, params).await?;
        Ok(result.rows_affected > 0)
    }

    /// Give user `id` a fresh code if it still holds `previous_code`
    pub async fn reissue_code(&self, id: i64, previous_code: &str) -> Result<bool> {
        self.issuer
            .reissue_code(
                id,
                previous_code,
                |candidate| async move { self.get_code(&candidate, None).await },
                |id, previous, code| async move { self.replace_code(id, &previous, &code).await },
            )
            .await
    }

    /// `UPDATE ... SET code = new WHERE id = ? AND code = previous`
    async fn replace_code(&self, id: i64, previous_code: &str, code: &str) -> Result<bool> {
        let mut data = ColumnValues::new();
        data.insert("code".to_string(), SqlValue::from(code));

        let (sql, params) = self
            .table()
            .where_eq("id", id)
            .where_eq("code", previous_code)
            .build_update(&data)?;
        let result = self.adapter.execute(&sql, params).await?;
        Ok(result.rows_affected > 0)
    }

    /// Delete user `id`; `false` when no such user exists
    pub async fn delete_user(&self, id: i64) -> Result<bool> {
        if self.get_user_by_id(id).await?.is_none() {
            log::warn!("Delete requested for missing user {}", id);
            return Ok(false);
        }

        let (sql, params) = self.table().where_eq("id", id).build_delete()?;
        let result = self.adapter.execute(&sql, params).await?;
        Ok(result.rows_affected > 0)
    }

    /// Create the users table for the adapter's backend
    pub async fn create_table(&self, if_not_exists: bool) -> Result<()> {
        let schema = SchemaBuilder::new(self.adapter.backend());
        let sql = schema
            .create_table(&self.config.table)
            .if_not_exists(if_not_exists)
            .id()
            .string("nombre", 100)
            .string("login", 50)
            .required()
            .string("pass", 128)
            .required()
            .string("correo", 100)
            .string("telefono", 20)
            .string("perfil", 30)
            .required()
            .string("code", CODE_LENGTH)
            .unique(self.config.unique_code_constraint)
            .build();

        self.adapter.execute(&sql, Vec::new()).await?;
        Ok(())
    }
}
