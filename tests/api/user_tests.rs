//! User API Tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use chat_hub::application::dto::UserView;

use crate::common::{as_user, unique_login, unique_name, TestApp};

#[tokio::test]
async fn register_returns_created_user_with_login() {
    let app = TestApp::new();
    let name = unique_name();
    let login = unique_login();

    let response = app
        .server
        .post("/api/v1/users")
        .json(&json!({ "name": name, "login": login, "secret_key": "s3cret" }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let user: UserView = response.json();
    assert_eq!(user.name, name);
    assert_eq!(user.login.as_deref(), Some(login.as_str()));
}

#[tokio::test]
async fn register_with_taken_login_is_conflict() {
    let app = TestApp::new();
    let existing = app.user().await;

    let response = app
        .server
        .post("/api/v1/users")
        .json(&json!({ "name": unique_name(), "login": existing.login, "secret_key": "s3cret" }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["code"], 10005);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn protected_route_without_credentials_is_unauthorized() {
    let app = TestApp::new();

    let response = app.server.get("/api/v1/users/@me").await;

    response.assert_status_unauthorized();
    assert_eq!(response.json::<Value>()["code"], 10003);
}

#[tokio::test]
async fn wrong_secret_key_is_unauthorized() {
    let app = TestApp::new();
    let mut user = app.user().await;
    user.secret_key = "not the key".to_string();

    let response = as_user(app.server.get("/api/v1/users/@me"), &user).await;

    response.assert_status_unauthorized();
}

#[tokio::test]
async fn current_user_includes_login() {
    let app = TestApp::new();
    let user = app.user().await;

    let response = as_user(app.server.get("/api/v1/users/@me"), &user).await;

    response.assert_status_ok();
    let me: UserView = response.json();
    assert_eq!(me.id, user.id());
    assert_eq!(me.login.as_deref(), Some(user.login.as_str()));
}

#[tokio::test]
async fn other_users_are_shown_without_login() {
    let app = TestApp::new();
    let alice = app.user().await;
    let bob = app.user().await;

    let response = as_user(app.server.get(&format!("/api/v1/users/{}", bob.id())), &alice).await;

    response.assert_status_ok();
    let view: UserView = response.json();
    assert_eq!(view.name, bob.name());
    assert_eq!(view.login, None);
}

#[tokio::test]
async fn unknown_user_is_not_found() {
    let app = TestApp::new();
    let alice = app.user().await;

    let response = as_user(
        app.server.get(&format!("/api/v1/users/{}", uuid::Uuid::new_v4())),
        &alice,
    )
    .await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["code"], 10001);
}

#[tokio::test]
async fn renamed_user_keeps_their_credentials() {
    let app = TestApp::new();
    let user = app.user().await;
    let new_name = unique_name();

    as_user(app.server.patch("/api/v1/users/@me"), &user)
        .json(&json!({ "name": new_name }))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let me: UserView = as_user(app.server.get("/api/v1/users/@me"), &user).await.json();
    assert_eq!(me.name, new_name);
}

#[tokio::test]
async fn availability_checks_are_public() {
    let app = TestApp::new();
    let user = app.user().await;

    let taken = app
        .server
        .get("/api/v1/users/login-used")
        .add_query_param("value", &user.login)
        .await;
    let free = app
        .server
        .get("/api/v1/users/name-used")
        .add_query_param("value", unique_name())
        .await;

    taken.assert_status_ok();
    assert_eq!(taken.json::<Value>()["used"], true);
    assert_eq!(free.json::<Value>()["used"], false);
}
