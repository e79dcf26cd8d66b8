//! Login, logout and the admin gate in front of the operator pages.

use axum::http::StatusCode;

use crate::common::*;

async fn login_cookie(state: &AppState, user_name: &str) -> String {
    let response = send(
        state,
        post_form(
            "/login",
            &format!("user_name={}&password={}", user_name, TEST_PASSWORD),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/operator/list");
    cookie_pair(&response, "session").expect("session cookie set")
}

#[tokio::test]
async fn test_anonymous_request_is_sent_to_login() {
    let app = create_test_app(true);

    let response = send(&app.state, get("/operator/list")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_anonymous_write_is_not_performed() {
    let app = create_test_app(true);
    let alice = create_test_operator(&app.state, "alice", OperatorRole::Standard);

    let response = send(&app.state, get(&format!("/operator/upgrade/{}", alice.id))).await;
    assert_eq!(location(&response), "/login");
    let alice = app.state.operators.find_by_id(alice.id).unwrap().unwrap();
    assert_eq!(alice.role, OperatorRole::Standard);
}

#[tokio::test]
async fn test_login_page_renders() {
    let app = create_test_app(true);

    let response = send(&app.state, get("/login")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("action=\"/login\""));
}

#[tokio::test]
async fn test_wrong_password_rerenders_login() {
    let app = create_test_app(true);
    create_test_operator(&app.state, SUPER_ADMIN, OperatorRole::Admin);

    let response = send(
        &app.state,
        post_form("/login", &format!("user_name={}&password=nope-nope", SUPER_ADMIN)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(cookie_pair(&response, "session").is_none());
    let body = body_string(response).await;
    assert!(body.contains("Invalid user name or password"));
    assert!(body.contains(&format!("value=\"{}\"", SUPER_ADMIN)));
}

#[tokio::test]
async fn test_unknown_user_cannot_log_in() {
    let app = create_test_app(true);

    let response = send(&app.state, post_form("/login", "user_name=ghost&password=whatever1")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_session_sees_list_with_identity() {
    let app = create_test_app(true);
    create_test_operator(&app.state, SUPER_ADMIN, OperatorRole::Admin);
    create_test_operator(&app.state, "alice", OperatorRole::Standard);
    let cookie = login_cookie(&app.state, SUPER_ADMIN).await;

    let response = send(&app.state, get_with_cookie("/operator/list", &cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains(&format!("Signed in as <strong>{}</strong>", SUPER_ADMIN)));
    assert!(body.contains("<td class=\"user-name\">alice</td>"));
}

#[tokio::test]
async fn test_standard_operator_is_forbidden() {
    let app = create_test_app(true);
    create_test_operator(&app.state, "alice", OperatorRole::Standard);
    let cookie = login_cookie(&app.state, "alice").await;

    let response = send(&app.state, get_with_cookie("/operator/list", &cookie)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_demoted_session_loses_access_immediately() {
    let app = create_test_app(true);
    let bob = create_test_operator(&app.state, "bob", OperatorRole::Admin);
    let cookie = login_cookie(&app.state, "bob").await;

    app.state.operators.demote(bob.id).unwrap();

    let response = send(&app.state, get_with_cookie("/operator/list", &cookie)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_session_of_deleted_operator_is_anonymous() {
    let app = create_test_app(true);
    let bob = create_test_operator(&app.state, "bob", OperatorRole::Admin);
    let cookie = login_cookie(&app.state, "bob").await;

    app.state.operators.delete_by_id(bob.id).unwrap();

    let response = send(&app.state, get_with_cookie("/operator/list", &cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_forged_session_cookie_is_ignored() {
    let app = create_test_app(true);

    let response = send(
        &app.state,
        get_with_cookie("/operator/list", "session=eyJhbGciOiJub25lIn0.e30."),
    )
    .await;
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_cannot_delete_or_demote_yourself() {
    let app = create_test_app(true);
    let bob = create_test_operator(&app.state, "bob", OperatorRole::Admin);
    let cookie = login_cookie(&app.state, "bob").await;

    let response = send(
        &app.state,
        get_with_cookie(&format!("/operator/delete/{}", bob.id), &cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &app.state,
        get_with_cookie(&format!("/operator/demote/{}", bob.id), &cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bob = app.state.operators.find_by_id(bob.id).unwrap().unwrap();
    assert_eq!(bob.role, OperatorRole::Admin);
}

#[tokio::test]
async fn test_admin_can_manage_other_operators() {
    let app = create_test_app(true);
    create_test_operator(&app.state, "bob", OperatorRole::Admin);
    let alice = create_test_operator(&app.state, "alice", OperatorRole::Standard);
    let cookie = login_cookie(&app.state, "bob").await;

    let response = send(
        &app.state,
        get_with_cookie(&format!("/operator/upgrade/{}", alice.id), &cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(flash_value(&response).as_deref(), Some("upgraded:alice"));
}

#[tokio::test]
async fn test_logout_clears_session() {
    let app = create_test_app(true);
    create_test_operator(&app.state, "bob", OperatorRole::Admin);
    let cookie = login_cookie(&app.state, "bob").await;

    let response = send(&app.state, get_with_cookie("/logout", &cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
    let cleared = set_cookie_header(&response, "session").expect("session cookie cleared");
    assert!(cleared.starts_with("session=;"));
}
