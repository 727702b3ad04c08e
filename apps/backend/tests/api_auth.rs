//! Login and account management API tests.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use academy_backend::models::{Role, User};
use academy_backend::services::auth::hash_password;
use common::fixtures::{ADMIN, PARENT, STUDENT, TEACHER};
use common::TestContext;

#[tokio::test]
async fn test_health_is_public() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.text(), "OK");
}

#[tokio::test]
async fn test_login_returns_token_and_user() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server
        .post("/api/auth/login")
        .json(&json!({ "id": STUDENT.0, "password": STUDENT.1 }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert!(!body["token"].as_str().unwrap().is_empty());
    assert_eq!(body["user"]["id"], "student1");
    assert_eq!(body["user"]["role"], "student");
    assert_eq!(body["user"]["math_class"], "수학A");
    assert!(body["user"].get("pw").is_none());
}

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server
        .post("/api/auth/login")
        .json(&json!({ "id": STUDENT.0, "password": "nope" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = server
        .post("/api/auth/login")
        .json(&json!({ "id": "ghost", "password": "1234" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_routes_need_token() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server.get("/api/auth/me").await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = server
        .get("/api/auth/me")
        .add_header(
            axum::http::header::AUTHORIZATION,
            TestContext::auth_header_value("not-a-token"),
        )
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let token = TestContext::login(&server, PARENT.0, PARENT.1).await;

    let response = server
        .get("/api/auth/me")
        .add_header(
            axum::http::header::AUTHORIZATION,
            TestContext::auth_header_value(&token),
        )
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["linked_student"], "student1");

    let response = server
        .post("/api/auth/logout")
        .add_header(
            axum::http::header::AUTHORIZATION,
            TestContext::auth_header_value(&token),
        )
        .await;
    response.assert_status(StatusCode::NO_CONTENT);

    let response = server
        .get("/api/auth/me")
        .add_header(
            axum::http::header::AUTHORIZATION,
            TestContext::auth_header_value(&token),
        )
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_plaintext_password_is_upgraded_on_login() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let mut users = ctx.sheets().load::<User>().await.unwrap();
    users.push(User {
        id: "legacy".to_string(),
        pw: "plain".to_string(),
        name: "Legacy".to_string(),
        role: Role::Student,
        subject: String::new(),
        linked_student: String::new(),
        math_class: String::new(),
        eng_class: String::new(),
    });
    ctx.sheets().save(&users).await.unwrap();

    TestContext::login(&server, "legacy", "plain").await;

    let stored = ctx.sheets().find_user("legacy").await.unwrap().unwrap();
    assert_eq!(stored.pw, hash_password("plain"));

    // Still works after the upgrade
    TestContext::login(&server, "legacy", "plain").await;
}

#[tokio::test]
async fn test_teacher_manages_students() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let token = TestContext::login(&server, TEACHER.0, TEACHER.1).await;

    let response = server
        .post("/api/users")
        .add_header(
            axum::http::header::AUTHORIZATION,
            TestContext::auth_header_value(&token),
        )
        .json(&json!({
            "id": "student2",
            "password": "pw2",
            "name": "이영희",
            "role": "student",
            "math_class": "수학B",
        }))
        .await;
    response.assert_status(StatusCode::CREATED);

    // Duplicate id
    let response = server
        .post("/api/users")
        .add_header(
            axum::http::header::AUTHORIZATION,
            TestContext::auth_header_value(&token),
        )
        .json(&json!({ "id": "student2", "password": "x", "name": "x", "role": "student" }))
        .await;
    response.assert_status(StatusCode::CONFLICT);

    let response = server
        .put("/api/users/student2")
        .add_header(
            axum::http::header::AUTHORIZATION,
            TestContext::auth_header_value(&token),
        )
        .json(&json!({ "eng_class": "영어A", "password": "" }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["eng_class"], "영어A");
    assert_eq!(body["math_class"], "수학B");

    // Blank password kept the old one
    TestContext::login(&server, "student2", "pw2").await;

    let response = server
        .get("/api/users")
        .add_query_param("role", "student")
        .add_header(
            axum::http::header::AUTHORIZATION,
            TestContext::auth_header_value(&token),
        )
        .await;
    response.assert_status_ok();
    let body: Vec<serde_json::Value> = response.json();
    let ids: Vec<&str> = body.iter().map(|u| u["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["student1", "student2"]);

    let response = server
        .delete("/api/users/student2")
        .add_header(
            axum::http::header::AUTHORIZATION,
            TestContext::auth_header_value(&token),
        )
        .await;
    response.assert_status(StatusCode::NO_CONTENT);
    assert!(ctx.sheets().find_user("student2").await.unwrap().is_none());
}

#[tokio::test]
async fn test_only_admin_manages_teachers() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let teacher = TestContext::login(&server, TEACHER.0, TEACHER.1).await;
    let admin = TestContext::login(&server, ADMIN.0, ADMIN.1).await;

    let new_teacher = json!({
        "id": "t_sci",
        "password": "1234",
        "name": "과학쌤",
        "role": "teacher",
        "subject": "과학",
    });

    let response = server
        .post("/api/users")
        .add_header(
            axum::http::header::AUTHORIZATION,
            TestContext::auth_header_value(&teacher),
        )
        .json(&new_teacher)
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    let response = server
        .post("/api/users")
        .add_header(
            axum::http::header::AUTHORIZATION,
            TestContext::auth_header_value(&admin),
        )
        .json(&new_teacher)
        .await;
    response.assert_status(StatusCode::CREATED);

    let response = server
        .delete("/api/users/admin")
        .add_header(
            axum::http::header::AUTHORIZATION,
            TestContext::auth_header_value(&admin),
        )
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_students_cannot_list_accounts() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let token = TestContext::login(&server, STUDENT.0, STUDENT.1).await;

    let response = server
        .get("/api/users")
        .add_header(
            axum::http::header::AUTHORIZATION,
            TestContext::auth_header_value(&token),
        )
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
}

/// Accounts survive in PostgreSQL between contexts.
#[tokio::test]
#[ignore = "requires database"]
async fn test_accounts_persist_in_database() {
    let ctx = TestContext::with_database().await;
    let server = ctx.server();
    let token = TestContext::login(&server, ADMIN.0, ADMIN.1).await;

    let id = format!("db_{}", uuid::Uuid::new_v4().simple());
    let response = server
        .post("/api/users")
        .add_header(
            axum::http::header::AUTHORIZATION,
            TestContext::auth_header_value(&token),
        )
        .json(&json!({ "id": id, "password": "pw", "name": "DB", "role": "student" }))
        .await;
    response.assert_status(StatusCode::CREATED);

    let other = TestContext::with_database().await;
    assert!(other.sheets().find_user(&id).await.unwrap().is_some());

    // Cleanup
    let response = server
        .delete(&format!("/api/users/{id}"))
        .add_header(
            axum::http::header::AUTHORIZATION,
            TestContext::auth_header_value(&token),
        )
        .await;
    response.assert_status(StatusCode::NO_CONTENT);
}
