#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use usuarios::database::SqliteAdapter;
use usuarios::prelude::*;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Hands out the queued codes in order, then keeps repeating the last one
pub struct ScriptedGenerator {
    codes: Mutex<VecDeque<String>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedGenerator {
    pub fn new(codes: &[&str]) -> Self {
        Self {
            codes: Mutex::new(codes.iter().map(|c| c.to_string()).collect()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared handle to the number of generated candidates
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl CodeGenerator for ScriptedGenerator {
    fn generate(&self) -> String {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut codes = self.codes.lock().unwrap();
        if codes.len() > 1 {
            codes.pop_front().unwrap()
        } else {
            codes.front().cloned().unwrap()
        }
    }
}

/// Fresh in-memory SQLite database
pub async fn memory_adapter() -> Arc<dyn DatabaseAdapter> {
    init_logging();
    let adapter = SqliteAdapter::new(&DatabaseConfig::default()).await.unwrap();
    Arc::new(adapter)
}

/// Model over `adapter` with the table created
pub async fn model_with<G>(
    adapter: Arc<dyn DatabaseAdapter>,
    config: UsersConfig,
    generator: G,
) -> UserModel
where
    G: CodeGenerator + 'static,
{
    let model = UserModel::with_generator(adapter, config, generator);
    model.create_table(true).await.unwrap();
    model
}

/// Model over a fresh database with default settings
pub async fn memory_model<G>(generator: G) -> UserModel
where
    G: CodeGenerator + 'static,
{
    model_with(memory_adapter().await, UsersConfig::default(), generator).await
}

pub fn ana() -> NewUser {
    NewUser::new("Ana Pérez", "3001234567", "ana@example.com", "ana", "secret")
}

/// Insert a row with a fixed id and code, bypassing issuance
pub async fn seed_user(adapter: &Arc<dyn DatabaseAdapter>, id: i64, login: &str, code: &str) {
    adapter
        .execute(
            "INSERT INTO \"usuarios\" (\"id\", \"nombre\", \"login\", \"pass\", \"correo\", \"telefono\", \"perfil\", \"code\") VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            vec![
                SqlValue::from(id),
                SqlValue::from(format!("{} name", login)),
                SqlValue::from(login),
                SqlValue::from(usuarios::utils::crypto::md5("secret")),
                SqlValue::from(format!("{}@example.com", login)),
                SqlValue::from("555"),
                SqlValue::from("Usuario"),
                SqlValue::from(code),
            ],
        )
        .await
        .unwrap();
}

/// Every stored code, in id order
pub async fn stored_codes(adapter: &Arc<dyn DatabaseAdapter>) -> Vec<String> {
    let (sql, params) = adapter
        .query()
        .from("usuarios")
        .select(["code"])
        .order_by("id", OrderDirection::Asc)
        .build()
        .unwrap();
    adapter
        .fetch_all(&sql, params)
        .await
        .unwrap()
        .into_iter()
        .map(|row| row["code"].as_str().unwrap().to_string())
        .collect()
}
