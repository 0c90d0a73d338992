mod common;

use std::sync::atomic::Ordering;

use common::{
    ana, memory_adapter, memory_model, model_with, seed_user, stored_codes, ScriptedGenerator,
};
use usuarios::prelude::*;
use usuarios::utils::crypto;

#[tokio::test]
async fn test_create_user_stores_digest_and_default_role() {
    let model = memory_model(RandomCodeGenerator::seeded(7)).await;

    assert!(model.create_user(ana()).await.unwrap());

    let user = model.get_user_by_id(1).await.unwrap().unwrap();
    assert_eq!(user.login, "ana");
    assert_eq!(user.display_name, "Ana Pérez");
    assert_eq!(user.email, "ana@example.com");
    assert_eq!(user.phone, "3001234567");
    assert_eq!(user.role, "Usuario");
    assert_eq!(user.password_digest, crypto::md5("secret"));
    assert_eq!(user.confirmation_code.len(), 10);
    assert!(user
        .confirmation_code
        .chars()
        .all(|c| c.is_ascii_alphanumeric()));
}

#[tokio::test]
async fn test_create_user_with_explicit_role() {
    let model = memory_model(RandomCodeGenerator::seeded(8)).await;

    model
        .create_user(ana().with_role("Administrador"))
        .await
        .unwrap();

    let user = model.get_user_by_id(1).await.unwrap().unwrap();
    assert_eq!(user.role, "Administrador");
}

#[tokio::test]
async fn test_create_user_rejects_invalid_input_before_issuing() {
    let generator = ScriptedGenerator::new(&["Bq3xZ0pLm9"]);
    let calls = generator.call_counter();
    let model = memory_model(generator).await;

    let mut user = ana();
    user.login.clear();
    let err = model.create_user(user).await.unwrap_err();

    assert_eq!(err.error_code(), "E_VALIDATION");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(model.get_user_by_id(1).await.unwrap().is_none());
}

#[tokio::test]
async fn test_collision_on_existing_code_regenerates() {
    let adapter = memory_adapter().await;
    let generator = ScriptedGenerator::new(&["AAAAAAAAAA", "Bq3xZ0pLm9"]);
    let calls = generator.call_counter();
    let model = model_with(adapter.clone(), UsersConfig::default(), generator).await;
    seed_user(&adapter, 1, "existing", "AAAAAAAAAA").await;

    assert!(model.create_user(ana()).await.unwrap());

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(stored_codes(&adapter).await, vec!["AAAAAAAAAA", "Bq3xZ0pLm9"]);
}

#[tokio::test]
async fn test_issue_code_retries_once_per_collision() {
    let adapter = memory_adapter().await;
    let generator = ScriptedGenerator::new(&[
        "TAKEN00001",
        "TAKEN00002",
        "TAKEN00003",
        "FREE000004",
    ]);
    let calls = generator.call_counter();
    let model = model_with(adapter.clone(), UsersConfig::default(), generator).await;
    seed_user(&adapter, 1, "uno", "TAKEN00001").await;
    seed_user(&adapter, 2, "dos", "TAKEN00002").await;
    seed_user(&adapter, 3, "tres", "TAKEN00003").await;

    let code = model.issue_code().await.unwrap();

    assert_eq!(code, "FREE000004");
    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert!(model.get_code(&code, None).await.unwrap().is_none());
}

#[tokio::test]
async fn test_reissue_code_swaps_matching_previous_code() {
    let adapter = memory_adapter().await;
    let model = model_with(
        adapter.clone(),
        UsersConfig::default(),
        ScriptedGenerator::new(&["NEWCODE001"]),
    )
    .await;
    seed_user(&adapter, 42, "ana", "OLDCODE123").await;

    assert!(model.reissue_code(42, "OLDCODE123").await.unwrap());

    let user = model.get_user_by_id(42).await.unwrap().unwrap();
    assert_eq!(user.confirmation_code, "NEWCODE001");
    assert!(model.get_code("OLDCODE123", None).await.unwrap().is_none());
}

#[tokio::test]
async fn test_reissue_code_with_stale_previous_code_is_noop() {
    let adapter = memory_adapter().await;
    let model = model_with(
        adapter.clone(),
        UsersConfig::default(),
        ScriptedGenerator::new(&["NEWCODE001"]),
    )
    .await;
    seed_user(&adapter, 42, "ana", "OLDCODE123").await;

    assert!(!model.reissue_code(42, "CHANGED001").await.unwrap());
    assert!(!model.reissue_code(7, "OLDCODE123").await.unwrap());

    let user = model.get_user_by_id(42).await.unwrap().unwrap();
    assert_eq!(user.confirmation_code, "OLDCODE123");
}

#[tokio::test]
async fn test_get_code_scoped_to_user() {
    let adapter = memory_adapter().await;
    let model = model_with(
        adapter.clone(),
        UsersConfig::default(),
        RandomCodeGenerator::seeded(3),
    )
    .await;
    seed_user(&adapter, 42, "ana", "OLDCODE123").await;

    let row = model.get_code("OLDCODE123", None).await.unwrap().unwrap();
    assert_eq!(row.code, "OLDCODE123");
    assert!(model.get_code("OLDCODE123", Some(42)).await.unwrap().is_some());
    assert!(model.get_code("OLDCODE123", Some(43)).await.unwrap().is_none());
    assert!(model.get_code("NOPE000000", None).await.unwrap().is_none());
}

#[tokio::test]
async fn test_get_user_checks_password_digest() {
    let model = memory_model(RandomCodeGenerator::seeded(11)).await;
    model.create_user(ana()).await.unwrap();

    let found = model.get_user("ana", "secret").await.unwrap();
    let user = found.found().unwrap();
    assert_eq!(user.login, "ana");
    assert!(model.verify_password(&user, "secret"));
    assert!(!model.verify_password(&user, "Secret"));

    assert_eq!(
        model.get_user("ana", "wrong").await.unwrap(),
        LookupOutcome::Invalid
    );
    assert_eq!(
        model.get_user("nobody", "secret").await.unwrap(),
        LookupOutcome::Invalid
    );
}

#[tokio::test]
async fn test_configured_digest_algorithm() {
    let config = UsersConfig {
        password_digest: DigestAlgorithm::Sha256,
        ..UsersConfig::default()
    };
    let model = model_with(
        memory_adapter().await,
        config,
        RandomCodeGenerator::seeded(12),
    )
    .await;
    model.create_user(ana()).await.unwrap();

    let user = model.get_user_by_id(1).await.unwrap().unwrap();
    assert_eq!(user.password_digest, crypto::sha256("secret"));
    assert!(model.get_user("ana", "secret").await.unwrap().is_found());
}

#[tokio::test]
async fn test_credentials_by_email() {
    let model = memory_model(ScriptedGenerator::new(&["Bq3xZ0pLm9"])).await;
    model.create_user(ana()).await.unwrap();

    let credentials = model
        .get_credentials_by_email("ana@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(credentials.id, 1);
    assert_eq!(credentials.login, "ana");
    assert_eq!(credentials.password_digest, crypto::md5("secret"));
    assert_eq!(credentials.confirmation_code, "Bq3xZ0pLm9");

    assert!(model
        .get_credentials_by_email("nadie@example.com")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_search_by_login_or_name() {
    let adapter = memory_adapter().await;
    let model = model_with(
        adapter.clone(),
        UsersConfig::default(),
        RandomCodeGenerator::seeded(5),
    )
    .await;
    seed_user(&adapter, 1, "carlos", "CODE000001").await;
    seed_user(&adapter, 2, "marta", "CODE000002").await;
    model
        .update_user(
            2,
            UserUpdate {
                display_name: "Marta Carlota".to_string(),
                email: "marta@example.com".to_string(),
                login: "marta".to_string(),
                phone: "555".to_string(),
                role: None,
            },
        )
        .await
        .unwrap();

    // "carl" matches the first login and the second display name
    let users = model.search_users("carl").await.unwrap();
    let logins: Vec<&str> = users.iter().map(|u| u.login.as_str()).collect();
    assert_eq!(logins, vec!["carlos", "marta"]);

    match model.search_by_login("carl").await.unwrap() {
        LookupOutcome::Found(user) => assert_eq!(user.login, "carlos"),
        other => panic!("expected a match, got {:?}", other),
    }
    assert_eq!(
        model.search_by_login("zzz").await.unwrap(),
        LookupOutcome::NotFound
    );
}

#[tokio::test]
async fn test_search_treats_like_metacharacters_literally() {
    let adapter = memory_adapter().await;
    let model = model_with(
        adapter.clone(),
        UsersConfig::default(),
        RandomCodeGenerator::seeded(6),
    )
    .await;
    seed_user(&adapter, 1, "ana_1", "CODE000001").await;
    seed_user(&adapter, 2, "anaX1", "CODE000002").await;
    seed_user(&adapter, 3, "100%real", "CODE000003").await;

    let users = model.search_users("a_1").await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].login, "ana_1");

    let users = model.search_users("0%r").await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].login, "100%real");

    assert_eq!(model.search_users("%").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_update_user_role_only_when_given() {
    let model = memory_model(RandomCodeGenerator::seeded(13)).await;
    model.create_user(ana()).await.unwrap();

    let mut changes = UserUpdate {
        display_name: "Ana María".to_string(),
        email: "ana.maria@example.com".to_string(),
        login: "anamaria".to_string(),
        phone: "3009999999".to_string(),
        role: None,
    };
    assert!(model.update_user(1, changes.clone()).await.unwrap());

    let user = model.get_user_by_id(1).await.unwrap().unwrap();
    assert_eq!(user.display_name, "Ana María");
    assert_eq!(user.login, "anamaria");
    assert_eq!(user.email, "ana.maria@example.com");
    assert_eq!(user.phone, "3009999999");
    assert_eq!(user.role, "Usuario");

    changes.role = Some("Administrador".to_string());
    assert!(model.update_user(1, changes.clone()).await.unwrap());
    let user = model.get_user_by_id(1).await.unwrap().unwrap();
    assert_eq!(user.role, "Administrador");

    assert!(!model.update_user(99, changes).await.unwrap());
}

#[tokio::test]
async fn test_update_user_blank_role_keeps_stored_role() {
    let model = memory_model(RandomCodeGenerator::seeded(14)).await;
    model
        .create_user(ana().with_role("Administrador"))
        .await
        .unwrap();

    let mut changes = UserUpdate {
        display_name: "Ana".to_string(),
        email: "ana@example.com".to_string(),
        login: "ana".to_string(),
        phone: "555".to_string(),
        role: Some(String::new()),
    };
    assert!(model.update_user(1, changes.clone()).await.unwrap());
    let user = model.get_user_by_id(1).await.unwrap().unwrap();
    assert_eq!(user.role, "Administrador");

    changes.role = Some("   ".to_string());
    assert!(model.update_user(1, changes).await.unwrap());
    let user = model.get_user_by_id(1).await.unwrap().unwrap();
    assert_eq!(user.role, "Administrador");
}

#[tokio::test]
async fn test_update_password() {
    let model = memory_model(RandomCodeGenerator::seeded(14)).await;
    model.create_user(ana()).await.unwrap();

    assert!(model.update_password(1, "nueva-clave").await.unwrap());

    assert_eq!(
        model.get_user("ana", "secret").await.unwrap(),
        LookupOutcome::Invalid
    );
    assert!(model.get_user("ana", "nueva-clave").await.unwrap().is_found());
    assert!(!model.update_password(99, "x").await.unwrap());
}

#[tokio::test]
async fn test_delete_user() {
    let model = memory_model(RandomCodeGenerator::seeded(15)).await;
    model.create_user(ana()).await.unwrap();

    assert!(!model.delete_user(99).await.unwrap());
    assert!(model.delete_user(1).await.unwrap());
    assert!(model.get_user_by_id(1).await.unwrap().is_none());
    assert!(!model.delete_user(1).await.unwrap());
}

#[tokio::test]
async fn test_unknown_id_is_none() {
    let model = memory_model(RandomCodeGenerator::seeded(16)).await;
    assert!(model.get_user_by_id(1).await.unwrap().is_none());
}

#[tokio::test]
async fn test_check_then_persist_race_stores_duplicate_codes() {
    let adapter = memory_adapter().await;
    let config = UsersConfig::default();
    let first = model_with(
        adapter.clone(),
        config.clone(),
        ScriptedGenerator::new(&["SAMECODE01"]),
    )
    .await;
    let second = model_with(
        adapter.clone(),
        config,
        ScriptedGenerator::new(&["SAMECODE01"]),
    )
    .await;

    // Both checks happen before either insert
    let code_a = first.issue_code().await.unwrap();
    let code_b = second.issue_code().await.unwrap();
    assert_eq!(code_a, code_b);

    let mut other = ana();
    other.login = "beto".to_string();
    other.email = "beto@example.com".to_string();
    assert!(first.insert_user(&ana(), &code_a).await.unwrap());
    assert!(second.insert_user(&other, &code_b).await.unwrap());

    assert_eq!(stored_codes(&adapter).await, vec!["SAMECODE01", "SAMECODE01"]);
}

#[tokio::test]
async fn test_unique_constraint_rejects_the_losing_insert() {
    let adapter = memory_adapter().await;
    let config = UsersConfig {
        unique_code_constraint: true,
        ..UsersConfig::default()
    };
    let first = model_with(
        adapter.clone(),
        config.clone(),
        ScriptedGenerator::new(&["SAMECODE01"]),
    )
    .await;
    let second = model_with(
        adapter.clone(),
        config,
        ScriptedGenerator::new(&["SAMECODE01"]),
    )
    .await;

    let code_a = first.issue_code().await.unwrap();
    let code_b = second.issue_code().await.unwrap();

    let mut other = ana();
    other.login = "beto".to_string();
    assert!(first.insert_user(&ana(), &code_a).await.unwrap());
    let err = second.insert_user(&other, &code_b).await.unwrap_err();

    assert!(err.is_storage_failure());
    assert_eq!(err.error_code(), "E_DB_QUERY");
    assert_eq!(stored_codes(&adapter).await, vec!["SAMECODE01"]);
}

#[tokio::test]
async fn test_storage_failure_propagates_from_issuance() {
    let adapter = memory_adapter().await;
    // No table: every lookup fails
    let model = UserModel::with_generator(
        adapter,
        UsersConfig::default(),
        ScriptedGenerator::new(&["Bq3xZ0pLm9"]),
    );

    let err = model.issue_code().await.unwrap_err();
    assert!(err.is_storage_failure());

    let err = model.reissue_code(42, "OLDCODE123").await.unwrap_err();
    assert!(err.is_storage_failure());
}

#[tokio::test]
async fn test_generate_code_does_not_touch_storage() {
    let adapter = memory_adapter().await;
    let model = UserModel::with_generator(
        adapter,
        UsersConfig::default(),
        RandomCodeGenerator::seeded(21),
    );

    let code = model.generate_code();
    assert_eq!(code.len(), 10);
    assert!(usuarios::utils::random::is_from_charset(
        &code,
        usuarios::utils::random::ALPHANUMERIC
    ));
}
