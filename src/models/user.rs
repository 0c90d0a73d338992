//! Record types of the `usuarios` table
//!
//! Rust field names are English; the serde renames map them onto the
//! table's column names.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// Reads a nullable text column as an empty string
fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A full row of the `usuarios` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,

    #[serde(rename = "nombre", default, deserialize_with = "null_as_empty")]
    pub display_name: String,

    pub login: String,

    /// Hex digest of the password, never the plaintext
    #[serde(rename = "pass")]
    pub password_digest: String,

    #[serde(rename = "correo", default, deserialize_with = "null_as_empty")]
    pub email: String,

    #[serde(rename = "telefono", default, deserialize_with = "null_as_empty")]
    pub phone: String,

    #[serde(rename = "perfil", default, deserialize_with = "null_as_empty")]
    pub role: String,

    #[serde(rename = "code", default, deserialize_with = "null_as_empty")]
    pub confirmation_code: String,
}

/// The `id, login, pass, code` projection used for credential recovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCredentials {
    pub id: i64,

    pub login: String,

    #[serde(rename = "pass")]
    pub password_digest: String,

    #[serde(rename = "code", default, deserialize_with = "null_as_empty")]
    pub confirmation_code: String,
}

/// Result of a confirmation code lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeRow {
    pub code: String,
}

/// Data for a new user. `password` is plaintext; the model stores its digest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub display_name: String,
    pub phone: String,
    pub email: String,
    pub login: String,
    pub password: String,
    /// `None` stores the configured default role
    #[serde(default)]
    pub role: Option<String>,
}

impl NewUser {
    pub fn new(
        display_name: impl Into<String>,
        phone: impl Into<String>,
        email: impl Into<String>,
        login: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            phone: phone.into(),
            email: email.into(),
            login: login.into(),
            password: password.into(),
            role: None,
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.login.trim().is_empty() {
            return Err(Error::validation("login is required"));
        }
        if self.password.is_empty() {
            return Err(Error::validation("password is required"));
        }
        if matches!(&self.role, Some(role) if role.trim().is_empty()) {
            return Err(Error::validation("role cannot be empty when given"));
        }
        Ok(())
    }
}

/// Profile changes for an existing user.
///
/// `role` is only written when present and non-blank; regular users update
/// their own profile without it, administrators pass it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdate {
    pub display_name: String,
    pub email: String,
    pub login: String,
    pub phone: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// Outcome of a lookup that distinguishes "no match" from "bad credentials"
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome<T> {
    Found(T),
    NotFound,
    Invalid,
}

impl<T> LookupOutcome<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, LookupOutcome::Found(_))
    }

    pub fn found(self) -> Option<T> {
        match self {
            LookupOutcome::Found(value) => Some(value),
            LookupOutcome::NotFound | LookupOutcome::Invalid => None,
        }
    }
}
