//! Operator persistence through the service layer.

use operator_admin::error::AppError;
use operator_admin::models::{CreateOperator, UpdateOperator};

use crate::common::*;

#[tokio::test]
async fn test_save_assigns_increasing_ids() {
    let app = create_test_app(false);
    let operators = &app.state.operators;

    let alice = operators
        .save(&CreateOperator {
            user_name: "alice".into(),
            password: TEST_PASSWORD.into(),
        })
        .await
        .unwrap();
    let bob = operators
        .save(&CreateOperator {
            user_name: "bob".into(),
            password: TEST_PASSWORD.into(),
        })
        .await
        .unwrap();

    assert!(bob.id > alice.id);
    assert_eq!(alice.role, OperatorRole::Standard);

    let all: Vec<String> = operators
        .find_all()
        .unwrap()
        .into_iter()
        .map(|o| o.user_name)
        .collect();
    assert_eq!(all, vec!["alice", "bob"]);
}

#[test]
fn test_find_by_id_missing_is_none() {
    let app = create_test_app(false);
    assert!(app.state.operators.find_by_id(12345).unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_insert_maps_to_bad_request() {
    let app = create_test_app(false);
    create_test_operator(&app.state, "alice", OperatorRole::Standard);

    let err = app
        .state
        .operators
        .create("alice", TEST_PASSWORD, OperatorRole::Standard)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "got {:?}", err);
}

#[test]
fn test_user_name_taken_ignores_own_row() {
    let app = create_test_app(false);
    let alice = create_test_operator(&app.state, "alice", OperatorRole::Standard);
    let operators = &app.state.operators;

    assert!(operators.user_name_taken("alice", None).unwrap());
    assert!(!operators.user_name_taken("alice", Some(alice.id)).unwrap());
    assert!(!operators.user_name_taken("nobody", None).unwrap());
}

#[tokio::test]
async fn test_update_changes_name_and_bumps_updated_at() {
    let app = create_test_app(false);
    let alice = create_test_operator(&app.state, "alice", OperatorRole::Admin);
    let operators = &app.state.operators;

    let updated = operators
        .update(
            alice.id,
            &UpdateOperator {
                id: alice.id,
                user_name: "alicia".into(),
                password: String::new(),
            },
        )
        .await
        .unwrap();
    assert!(updated);

    let row = operators.find_by_id(alice.id).unwrap().unwrap();
    assert_eq!(row.user_name, "alicia");
    assert_eq!(row.role, OperatorRole::Admin);
    assert_eq!(row.password_hash, alice.password_hash);
    assert!(row.updated_at >= alice.updated_at);
}

#[tokio::test]
async fn test_update_missing_row_returns_false() {
    let app = create_test_app(false);

    let updated = app
        .state
        .operators
        .update(
            99,
            &UpdateOperator {
                id: 99,
                user_name: "ghost".into(),
                password: String::new(),
            },
        )
        .await
        .unwrap();
    assert!(!updated);
}

#[test]
fn test_delete_by_id() {
    let app = create_test_app(false);
    let alice = create_test_operator(&app.state, "alice", OperatorRole::Standard);
    let operators = &app.state.operators;

    assert!(operators.delete_by_id(alice.id).unwrap());
    assert!(operators.find_by_id(alice.id).unwrap().is_none());
    assert!(!operators.delete_by_id(alice.id).unwrap());
}

#[tokio::test]
async fn test_authenticate_checks_password() {
    let app = create_test_app(false);
    create_test_operator(&app.state, "alice", OperatorRole::Standard);
    let operators = &app.state.operators;

    assert!(operators.authenticate("alice", TEST_PASSWORD).await.unwrap().is_some());
    assert!(operators.authenticate("alice", "wrong-password").await.unwrap().is_none());
    assert!(operators.authenticate("nobody", TEST_PASSWORD).await.unwrap().is_none());
}

#[tokio::test]
async fn test_ensure_super_admin_creates_once() {
    let app = create_test_app(false);
    let operators = &app.state.operators;

    assert!(operators.ensure_super_admin(SUPER_ADMIN, TEST_PASSWORD).await.unwrap());
    assert!(!operators.ensure_super_admin(SUPER_ADMIN, "other-password").await.unwrap());

    let root = operators.find_by_user_name(SUPER_ADMIN).unwrap().unwrap();
    assert_eq!(root.role, OperatorRole::Admin);
    // Second call must not overwrite the password
    assert!(operators.authenticate(SUPER_ADMIN, TEST_PASSWORD).await.unwrap().is_some());
}

#[tokio::test]
async fn test_ensure_super_admin_refuses_standard_row_under_reserved_name() {
    let app = create_test_app(false);
    create_test_operator(&app.state, SUPER_ADMIN, OperatorRole::Standard);
    let operators = &app.state.operators;

    let err = operators
        .ensure_super_admin(SUPER_ADMIN, TEST_PASSWORD)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Internal(_)), "got {:?}", err);

    // The stray row is left for an operator to fix, not silently promoted
    let root = operators.find_by_user_name(SUPER_ADMIN).unwrap().unwrap();
    assert_eq!(root.role, OperatorRole::Standard);
}

#[test]
fn test_unknown_role_in_row_is_an_error() {
    let app = create_test_app(false);
    let conn = app.state.db.get().unwrap();
    // Bypass the CHECK constraint to simulate a corrupted row
    conn.execute_batch(
        "PRAGMA ignore_check_constraints = ON;
         INSERT INTO operators (user_name, password_hash, role, created_at, updated_at)
         VALUES ('mallory', 'x', 'superuser', 0, 0);",
    )
    .unwrap();

    assert!(queries::get_operator_by_user_name(&conn, "mallory").is_err());
}
