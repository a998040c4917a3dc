//! User account routes.

mod common;

use agri_kb_platform_access::{Role, Session, SessionId};
use axum::http::StatusCode;
use chrono::Duration;
use common::*;
use serde_json::json;

#[tokio::test]
async fn register_signs_the_new_account_in() {
    let app = TestApp::new();

    let response = app
        .send(
            TestRequest::post("/api/users")
                .json(json!({
                    "username": "ada",
                    "firstName": "Ada",
                    "lastName": "Lovelace",
                    "email": "Ada@Example.com",
                    "password": "pw-123456",
                }))
                .build(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(cookie_value(&response, "token").is_some());
    assert!(cookie_value(&response, "refresh_token").is_some());

    let body = body_json(response).await;
    assert_eq!(body["email"], "ada@example.com");
    assert_eq!(body["firstName"], "Ada");
    assert_eq!(body["role"], "user");
    assert_eq!(body["roleRequest"], false);
    assert!(body.get("password").is_none());

    let response = login(&app, "ada@example.com", "pw-123456").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn register_rejects_missing_fields() {
    let app = TestApp::new();

    let response = app
        .send(
            TestRequest::post("/api/users")
                .json(json!({ "username": "ada", "email": "", "password": "pw" }))
                .build(),
        )
        .await;

    assert_error(
        response,
        StatusCode::BAD_REQUEST,
        "Please provide username, email, and password",
    )
    .await;
    assert_eq!(app.user_count().await, 0);
}

#[tokio::test]
async fn register_rejects_existing_email_in_any_case() {
    let app = TestApp::new();
    app.create_user("ada@example.com", "pw-123456", Role::User).await;

    let response = app
        .send(
            TestRequest::post("/api/users")
                .json(json!({
                    "username": "imposter",
                    "email": " ADA@example.com ",
                    "password": "pw-654321",
                }))
                .build(),
        )
        .await;

    assert_error(response, StatusCode::BAD_REQUEST, "User already exists").await;
    assert_eq!(app.user_count().await, 1);
}

#[tokio::test]
async fn profile_update_changes_own_fields() {
    let app = TestApp::new();
    let user = app.create_user("ada@example.com", "pw-123456", Role::User).await;
    let token = app.token_for(&user);

    let response = app
        .send(
            TestRequest::put("/api/users/profile")
                .token(&token)
                .json(json!({ "firstName": "Augusta", "password": "new-password" }))
                .build(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["firstName"], "Augusta");
    assert_eq!(body["lastName"], "User");

    assert_eq!(
        login(&app, "ada@example.com", "pw-123456").await.status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        login(&app, "ada@example.com", "new-password").await.status(),
        StatusCode::OK
    );
}

#[tokio::test]
async fn profile_update_refuses_another_accounts_email() {
    let app = TestApp::new();
    let user = app.create_user("ada@example.com", "pw-123456", Role::User).await;
    app.create_user("grace@example.com", "pw-123456", Role::User).await;
    let token = app.token_for(&user);

    let response = app
        .send(
            TestRequest::put("/api/users/profile")
                .token(&token)
                .json(json!({ "email": "Grace@example.com" }))
                .build(),
        )
        .await;

    assert_error(response, StatusCode::BAD_REQUEST, "Email already in use").await;
    let stored = app
        .state
        .users
        .find_by_id(user.id())
        .await
        .expect("find")
        .expect("present");
    assert_eq!(stored.email(), "ada@example.com");
}

#[tokio::test]
async fn role_request_flags_own_account() {
    let app = TestApp::new();
    let user = app.create_user("ada@example.com", "pw-123456", Role::User).await;
    let token = app.token_for(&user);

    let response = app
        .send(
            TestRequest::put(&format!("/api/users/{}/request", user.id()))
                .token(&token)
                .json(json!({}))
                .build(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["roleRequest"], true);
}

#[tokio::test]
async fn role_request_for_another_account_is_refused() {
    let app = TestApp::new();
    let user = app.create_user("ada@example.com", "pw-123456", Role::User).await;
    let other = app.create_user("grace@example.com", "pw-123456", Role::User).await;
    let token = app.token_for(&user);

    let response = app
        .send(
            TestRequest::put(&format!("/api/users/{}/request", other.id()))
                .token(&token)
                .json(json!({ "roleRequest": true }))
                .build(),
        )
        .await;

    assert_error(
        response,
        StatusCode::UNAUTHORIZED,
        "Not authorized to request a role for another user",
    )
    .await;
    let stored = app
        .state
        .users
        .find_by_id(other.id())
        .await
        .expect("find")
        .expect("present");
    assert!(!stored.role_request());
}

#[tokio::test]
async fn admin_grants_role_and_clears_request() {
    let app = TestApp::new();
    let admin = app.create_user("root@example.com", "pw-123456", Role::Admin).await;
    let user = app.create_user("ada@example.com", "pw-123456", Role::User).await;
    app.state
        .users
        .set_role_request(user.id(), true)
        .await
        .expect("request");

    let response = app
        .send(
            TestRequest::put(&format!("/api/users/{}", user.id()))
                .token(&app.token_for(&admin))
                .json(json!({ "role": "contributor", "roleRequest": false }))
                .build(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["role"], "contributor");
    assert_eq!(body["roleRequest"], false);

    let stored = app
        .state
        .users
        .find_by_id(user.id())
        .await
        .expect("find")
        .expect("present");
    assert_eq!(stored.role(), Role::Contributor);
}

#[tokio::test]
async fn admin_update_rejects_unknown_role() {
    let app = TestApp::new();
    let admin = app.create_user("root@example.com", "pw-123456", Role::Admin).await;
    let user = app.create_user("ada@example.com", "pw-123456", Role::User).await;

    let response = app
        .send(
            TestRequest::put(&format!("/api/users/{}", user.id()))
                .token(&app.token_for(&admin))
                .json(json!({ "role": "superuser" }))
                .build(),
        )
        .await;

    assert_error(response, StatusCode::BAD_REQUEST, "Invalid request body").await;
    let stored = app
        .state
        .users
        .find_by_id(user.id())
        .await
        .expect("find")
        .expect("present");
    assert_eq!(stored.role(), Role::User);
}

#[tokio::test]
async fn profile_edit_after_promotion_keeps_new_role() {
    let app = TestApp::new();
    let admin = app.create_user("root@example.com", "pw-123456", Role::Admin).await;
    let user = app.create_user("ada@example.com", "pw-123456", Role::User).await;
    let token = app.token_for(&user);

    let response = app
        .send(
            TestRequest::put(&format!("/api/users/{}", user.id()))
                .token(&app.token_for(&admin))
                .json(json!({ "role": "contributor" }))
                .build(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .send(
            TestRequest::put("/api/users/profile")
                .token(&token)
                .json(json!({ "lastName": "King" }))
                .build(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["lastName"], "King");
    assert_eq!(body["role"], "contributor");
}

#[tokio::test]
async fn login_body_missing_password_is_bad_request() {
    let app = TestApp::new();
    app.create_user("ada@example.com", "pw-123456", Role::User).await;

    let response = app
        .send(
            TestRequest::post("/api/users/login")
                .json(json!({ "email": "ada@example.com" }))
                .build(),
        )
        .await;

    assert_error(response, StatusCode::BAD_REQUEST, "Invalid request body").await;
}

#[tokio::test]
async fn login_for_unknown_email_matches_wrong_password() {
    let app = TestApp::new();
    app.create_user("ada@example.com", "pw-123456", Role::User).await;

    let unknown = login(&app, "nobody@example.com", "pw-123456").await;
    assert_error(unknown, StatusCode::UNAUTHORIZED, "Invalid email or password").await;

    let wrong = login(&app, "ada@example.com", "not-it").await;
    assert_error(wrong, StatusCode::UNAUTHORIZED, "Invalid email or password").await;
}

#[tokio::test]
async fn role_request_without_body_is_bad_request() {
    let app = TestApp::new();
    let user = app.create_user("ada@example.com", "pw-123456", Role::User).await;

    let response = app
        .send(
            TestRequest::put(&format!("/api/users/{}/request", user.id()))
                .token(&app.token_for(&user))
                .build(),
        )
        .await;

    assert_error(
        response,
        StatusCode::BAD_REQUEST,
        "Expected a JSON request body",
    )
    .await;
}

#[tokio::test]
async fn admin_reads_single_user() {
    let app = TestApp::new();
    let admin = app.create_user("root@example.com", "pw-123456", Role::Admin).await;
    let user = app.create_user("ada@example.com", "pw-123456", Role::User).await;

    let response = app
        .send(
            TestRequest::get(&format!("/api/users/{}", user.id()))
                .token(&app.token_for(&admin))
                .build(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["email"], "ada@example.com");
}

#[tokio::test]
async fn unknown_or_malformed_user_id_is_not_found() {
    let app = TestApp::new();
    let admin = app.create_user("root@example.com", "pw-123456", Role::Admin).await;
    let token = app.token_for(&admin);

    let missing = agri_kb_core::UserId::new().to_string();
    for id in ["not-an-id", missing.as_str()] {
        let response = app
            .send(
                TestRequest::get(&format!("/api/users/{id}"))
                    .token(&token)
                    .build(),
            )
            .await;
        assert_error(response, StatusCode::NOT_FOUND, "User not found").await;
    }
}

#[tokio::test]
async fn admin_delete_removes_account_and_sessions() {
    let app = TestApp::new();
    let admin = app.create_user("root@example.com", "pw-123456", Role::Admin).await;
    let user = app.create_user("ada@example.com", "pw-123456", Role::User).await;
    let session_id = SessionId::generate().expect("session id");
    app.state
        .sessions
        .create(&Session::new(session_id.clone(), user.id(), Duration::hours(1)))
        .await
        .expect("create session");

    let response = app
        .send(
            TestRequest::delete(&format!("/api/users/{}", user.id()))
                .token(&app.token_for(&admin))
                .build(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["message"], "User removed");
    assert!(
        app.state
            .users
            .find_by_id(user.id())
            .await
            .expect("find")
            .is_none()
    );
    assert!(
        app.state
            .sessions
            .find_by_id(&session_id)
            .await
            .expect("find")
            .is_none()
    );
}

#[tokio::test]
async fn list_users_returns_profiles() {
    let app = TestApp::new();
    let moderator = app.create_user("mod@example.com", "pw-123456", Role::Moderator).await;
    app.create_user("ada@example.com", "pw-123456", Role::User).await;

    let response = app
        .send(
            TestRequest::get("/api/users")
                .token(&app.token_for(&moderator))
                .build(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let users = body.as_array().expect("array");
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u.get("password").is_none()));
}

#[tokio::test]
async fn author_info_is_public() {
    let app = TestApp::new();
    let user = app.create_user("ada@example.com", "pw-123456", Role::Contributor).await;

    let response = app
        .send(TestRequest::get(&format!("/api/users/{}/author", user.id())).build())
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["username"], "ada");
    assert!(body.get("email").is_none());
    assert!(body.get("role").is_none());
}
