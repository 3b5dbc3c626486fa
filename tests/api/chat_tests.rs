//! Chat, Membership and Message API Tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use chat_hub::application::dto::{ChatView, MessageView, ReadStateView, UserView};

use crate::common::{as_user, TestApp, TestUser};

async fn create_group(app: &TestApp, owner: &TestUser, members: &[&TestUser]) -> ChatView {
    let ids: Vec<_> = members.iter().map(|m| m.id()).collect();
    let response = as_user(app.server.post("/api/v1/chats"), owner)
        .json(&json!({ "name": "Team", "member_ids": ids }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json()
}

#[tokio::test]
async fn message_flow_tracks_unread_until_marked_read() {
    let app = TestApp::new();
    let alice = app.user().await;
    let bob = app.user().await;
    let chat = create_group(&app, &alice, &[&bob]).await;
    assert_eq!(chat.unread_count, 0);

    let sent = as_user(app.server.post(&format!("/api/v1/chats/{}/messages", chat.id)), &bob)
        .json(&json!({ "text": "hi team" }))
        .await;
    sent.assert_status(StatusCode::CREATED);
    let message: MessageView = sent.json();
    assert_eq!(message.author_id, bob.id());

    let chats: Vec<ChatView> = as_user(app.server.get("/api/v1/chats"), &alice).await.json();
    assert_eq!(chats.len(), 1);
    assert_eq!(chats[0].unread_count, 1);
    assert_eq!(chats[0].last_message.as_ref().map(|m| m.id), Some(message.id));

    let read = as_user(app.server.put(&format!("/api/v1/chats/{}/read", chat.id)), &alice).await;
    read.assert_status_ok();
    assert_eq!(read.json::<ReadStateView>().unread_count, 0);

    let state: ReadStateView =
        as_user(app.server.get(&format!("/api/v1/chats/{}/read", chat.id)), &alice)
            .await
            .json();
    assert_eq!(state.unread_count, 0);
}

#[tokio::test]
async fn history_is_returned_newest_first() {
    let app = TestApp::new();
    let alice = app.user().await;
    let bob = app.user().await;
    let chat = create_group(&app, &alice, &[&bob]).await;
    let path = format!("/api/v1/chats/{}/messages", chat.id);

    for text in ["first", "second", "third"] {
        as_user(app.server.post(&path), &alice)
            .json(&json!({ "text": text }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let page: Vec<MessageView> = as_user(app.server.get(&path), &bob)
        .add_query_param("take", 2)
        .await
        .json();

    let texts: Vec<_> = page.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["third", "second"]);
}

#[tokio::test]
async fn outsider_is_forbidden() {
    let app = TestApp::new();
    let alice = app.user().await;
    let bob = app.user().await;
    let mallory = app.user().await;
    let chat = create_group(&app, &alice, &[&bob]).await;

    let response = as_user(
        app.server.get(&format!("/api/v1/chats/{}/messages", chat.id)),
        &mallory,
    )
    .await;

    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(response.json::<Value>()["code"], 10004);
}

#[tokio::test]
async fn blank_message_is_bad_request() {
    let app = TestApp::new();
    let alice = app.user().await;
    let bob = app.user().await;
    let chat = create_group(&app, &alice, &[&bob]).await;

    let response = as_user(app.server.post(&format!("/api/v1/chats/{}/messages", chat.id)), &alice)
        .json(&json!({ "text": "   " }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], 10002);
}

#[tokio::test]
async fn private_chat_is_named_after_the_counterpart() {
    let app = TestApp::new();
    let alice = app.user().await;
    let bob = app.user().await;

    let response = as_user(app.server.post("/api/v1/chats"), &alice)
        .json(&json!({ "member_ids": [bob.id()], "is_private": true }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let chat: ChatView = response.json();
    assert_eq!(chat.name, bob.name());

    let seen_by_bob: ChatView = as_user(app.server.get(&format!("/api/v1/chats/{}", chat.id)), &bob)
        .await
        .json();
    assert_eq!(seen_by_bob.name, alice.name());

    let rename = as_user(app.server.patch(&format!("/api/v1/chats/{}", chat.id)), &alice)
        .json(&json!({ "name": "Ours" }))
        .await;
    rename.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn owner_manages_members() {
    let app = TestApp::new();
    let alice = app.user().await;
    let bob = app.user().await;
    let carol = app.user().await;
    let chat = create_group(&app, &alice, &[&bob]).await;
    let members_path = format!("/api/v1/chats/{}/members", chat.id);

    as_user(app.server.post(&members_path), &bob)
        .json(&json!({ "user_ids": [carol.id()] }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    as_user(app.server.post(&members_path), &alice)
        .json(&json!({ "user_ids": [carol.id()] }))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let members: Vec<UserView> = as_user(app.server.get(&members_path), &carol).await.json();
    assert_eq!(members.len(), 3);

    as_user(app.server.delete(&format!("{members_path}/@me")), &carol)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    as_user(app.server.get(&members_path), &carol)
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn owner_can_hand_over_and_remove_chat() {
    let app = TestApp::new();
    let alice = app.user().await;
    let bob = app.user().await;
    let chat = create_group(&app, &alice, &[&bob]).await;
    let chat_path = format!("/api/v1/chats/{}", chat.id);

    as_user(app.server.put(&format!("{chat_path}/owner")), &alice)
        .json(&json!({ "owner_id": bob.id() }))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    as_user(app.server.delete(&chat_path), &alice)
        .await
        .assert_status(StatusCode::FORBIDDEN);
    as_user(app.server.delete(&chat_path), &bob)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    as_user(app.server.get(&chat_path), &bob)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
