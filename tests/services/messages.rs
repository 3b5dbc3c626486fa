//! Message and unread engine tests

use chrono::{TimeDelta, Utc};
use pretty_assertions::assert_eq;
use test_case::test_case;
use uuid::Uuid;

use chat_hub::application::dto::MessageView;
use chat_hub::application::services::{ChatService, MemberService, MessageService};
use chat_hub::domain::{MemberRepository, PageDirection, SessionFactory, UnitOfWork};
use chat_hub::shared::AppError;

use crate::common::*;

fn texts(messages: &[MessageView]) -> Vec<&str> {
    messages.iter().map(|m| m.text.as_str()).collect()
}

/// Five messages from the owner: m0 (oldest) to m4 (newest)
async fn history(state: &TestState) -> (TestUser, TestUser, Uuid, Vec<MessageView>) {
    let alice = create_user(state).await;
    let bob = create_user(state).await;
    let chat = create_group(state, &alice, &[&bob]).await;

    let mut posted = Vec::new();
    for i in 0..5 {
        posted.push(post(state, &alice, chat.id, &format!("m{i}")).await);
    }
    (alice, bob, chat.id, posted)
}

#[tokio::test]
async fn posted_message_reads_back_with_its_author() {
    let state = test_state();
    let alice = create_user(&state).await;
    let bob = create_user(&state).await;
    let chat = create_group(&state, &alice, &[&bob]).await;

    let posted = post(&state, &alice, chat.id, "hello").await;
    let page = state
        .messages
        .get_messages(bob.id(), chat.id, None, 10, PageDirection::Older)
        .await
        .unwrap();

    assert_eq!(page.len(), 1);
    assert_eq!(page[0], posted);
    assert_eq!(page[0].author_id, alice.id());
    assert_eq!(page[0].author_name, alice.name());
    assert_eq!(page[0].chat_id, chat.id);
}

#[tokio::test]
async fn every_other_member_gets_a_delivery() {
    let state = test_state();
    let alice = create_user(&state).await;
    let bob = create_user(&state).await;
    let carol = create_user(&state).await;
    let chat = create_group(&state, &alice, &[&bob, &carol]).await;
    post(&state, &alice, chat.id, "one").await;
    state.members.mark_read(bob.id(), chat.id, None).await.unwrap();

    let posted = state
        .messages
        .add_message(alice.id(), chat.id, "two")
        .await
        .unwrap();

    let mut deliveries: Vec<(Uuid, i64)> = posted
        .deliveries
        .iter()
        .map(|d| (d.recipient_id, d.recipient_unread_count))
        .collect();
    deliveries.sort();
    let mut expected = vec![(bob.id(), 1), (carol.id(), 2)];
    expected.sort();

    assert_eq!(deliveries, expected);
    assert!(posted.deliveries.iter().all(|d| d.message == posted.message));
}

#[tokio::test]
async fn member_who_read_ahead_gets_no_delivery() {
    let state = test_state();
    let alice = create_user(&state).await;
    let bob = create_user(&state).await;
    let chat = create_group(&state, &alice, &[&bob]).await;
    // The service clamps watermarks to the store clock; set one ahead of it directly
    let mut tx = state.store.begin().await.unwrap();
    tx.update_last_read(chat.id, bob.id(), Utc::now() + TimeDelta::hours(1))
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let posted = state
        .messages
        .add_message(alice.id(), chat.id, "you won't see this pushed")
        .await
        .unwrap();

    assert!(posted.deliveries.is_empty());
}

#[tokio::test]
async fn non_member_cannot_post_or_read() {
    let state = test_state();
    let alice = create_user(&state).await;
    let bob = create_user(&state).await;
    let mallory = create_user(&state).await;
    let chat = create_group(&state, &alice, &[&bob]).await;

    let post_err = state
        .messages
        .add_message(mallory.id(), chat.id, "hi")
        .await
        .unwrap_err();
    let read_err = state
        .messages
        .get_messages(mallory.id(), chat.id, None, 10, PageDirection::Older)
        .await
        .unwrap_err();

    assert!(matches!(post_err, AppError::Forbidden(_)));
    assert!(matches!(read_err, AppError::Forbidden(_)));
}

#[test_case(String::new() ; "empty")]
#[test_case("  \n ".to_string() ; "whitespace")]
#[test_case("x".repeat(3001) ; "too long")]
#[tokio::test]
async fn invalid_text_is_rejected(text: String) {
    let state = test_state();
    let alice = create_user(&state).await;
    let bob = create_user(&state).await;
    let chat = create_group(&state, &alice, &[&bob]).await;

    let err = state
        .messages
        .add_message(alice.id(), chat.id, &text)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)), "got {err:?}");
}

#[tokio::test]
async fn longest_text_is_accepted() {
    let state = test_state();
    let alice = create_user(&state).await;
    let bob = create_user(&state).await;
    let chat = create_group(&state, &alice, &[&bob]).await;

    let message = post(&state, &alice, chat.id, &"é".repeat(3000)).await;

    assert_eq!(message.text.chars().count(), 3000);
}

#[tokio::test]
async fn text_is_stored_as_written() {
    let state = test_state();
    let alice = create_user(&state).await;
    let bob = create_user(&state).await;
    let chat = create_group(&state, &alice, &[&bob]).await;
    let code = "    fn main() {}\n";

    let posted = post(&state, &alice, chat.id, code).await;
    let page = state
        .messages
        .get_messages(bob.id(), chat.id, None, 10, PageDirection::Older)
        .await
        .unwrap();

    assert_eq!(posted.text, code);
    assert_eq!(page[0].text, code);
}

#[test_case(0 ; "zero")]
#[test_case(-5 ; "negative")]
#[tokio::test]
async fn page_size_must_be_positive(take: i64) {
    let state = test_state();
    let (alice, _, chat_id, _) = history(&state).await;

    let err = state
        .messages
        .get_messages(alice.id(), chat_id, None, take, PageDirection::Older)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn latest_page_is_newest_first() {
    let state = test_state();
    let (_, bob, chat_id, _) = history(&state).await;

    let page = state
        .messages
        .get_messages(bob.id(), chat_id, None, 3, PageDirection::Older)
        .await
        .unwrap();

    assert_eq!(texts(&page), vec!["m4", "m3", "m2"]);
}

#[tokio::test]
async fn older_page_is_strictly_before_the_pivot() {
    let state = test_state();
    let (_, bob, chat_id, posted) = history(&state).await;

    let page = state
        .messages
        .get_messages(bob.id(), chat_id, Some(posted[3].created), 2, PageDirection::Older)
        .await
        .unwrap();

    assert_eq!(texts(&page), vec!["m2", "m1"]);
}

#[tokio::test]
async fn newer_page_is_adjacent_to_the_pivot() {
    let state = test_state();
    let (_, bob, chat_id, posted) = history(&state).await;

    let page = state
        .messages
        .get_messages(bob.id(), chat_id, Some(posted[1].created), 2, PageDirection::Newer)
        .await
        .unwrap();

    assert_eq!(texts(&page), vec!["m3", "m2"]);
}

#[tokio::test]
async fn around_unread_straddles_the_watermark() {
    let state = test_state();
    let (_, bob, chat_id, posted) = history(&state).await;
    state
        .members
        .mark_read(bob.id(), chat_id, Some(posted[1].created))
        .await
        .unwrap();

    let page = state
        .messages
        .get_around_unread(bob.id(), chat_id, 4)
        .await
        .unwrap();

    // Two unread adjacent to the watermark, then the read ones up to it
    assert_eq!(texts(&page), vec!["m3", "m2", "m1", "m0"]);
}

#[tokio::test]
async fn around_unread_fills_with_unread_when_nothing_was_read() {
    let state = test_state();
    let (_, bob, chat_id, _) = history(&state).await;

    let page = state
        .messages
        .get_around_unread(bob.id(), chat_id, 4)
        .await
        .unwrap();

    // Nothing precedes bob's join, so only the unread half is filled
    assert_eq!(texts(&page), vec!["m1", "m0"]);
}

#[tokio::test]
async fn unread_count_matches_messages_after_the_watermark() {
    let state = test_state();
    let alice = create_user(&state).await;
    let bob = create_user(&state).await;
    let carol = create_user(&state).await;
    let chat = create_group(&state, &alice, &[&bob, &carol]).await;

    post(&state, &alice, chat.id, "a1").await;
    let b1 = post(&state, &bob, chat.id, "b1").await;
    post(&state, &carol, chat.id, "c1").await;
    post(&state, &alice, chat.id, "a2").await;
    state
        .members
        .mark_read(carol.id(), chat.id, Some(b1.created))
        .await
        .unwrap();

    let unread = |views: Vec<chat_hub::application::dto::ChatView>| views[0].unread_count;
    // alice: b1, c1
    assert_eq!(unread(state.chats.get_all_chats(alice.id()).await.unwrap()), 2);
    // bob: a1, c1, a2
    assert_eq!(unread(state.chats.get_all_chats(bob.id()).await.unwrap()), 3);
    // carol: a2 (c1 is her own)
    assert_eq!(unread(state.chats.get_all_chats(carol.id()).await.unwrap()), 1);
}
