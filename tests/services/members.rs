//! Membership and read watermark tests

use chrono::{TimeDelta, Utc};
use pretty_assertions::assert_eq;
use uuid::Uuid;

use chat_hub::application::services::{ChatService, MemberService, MessageService};
use chat_hub::shared::AppError;

use crate::common::*;

#[tokio::test]
async fn add_members_is_idempotent() {
    let state = test_state();
    let alice = create_user(&state).await;
    let bob = create_user(&state).await;
    let carol = create_user(&state).await;
    let chat = create_group(&state, &alice, &[&bob]).await;

    state
        .members
        .add_members(alice.id(), chat.id, &[carol.id(), bob.id()])
        .await
        .unwrap();
    state
        .members
        .add_members(alice.id(), chat.id, &[carol.id()])
        .await
        .unwrap();

    let members = state.members.list_members(carol.id(), chat.id).await.unwrap();
    assert_eq!(members.len(), 3);
}

#[tokio::test]
async fn add_unknown_user_fails_and_adds_nobody() {
    let state = test_state();
    let alice = create_user(&state).await;
    let bob = create_user(&state).await;
    let carol = create_user(&state).await;
    let chat = create_group(&state, &alice, &[&bob]).await;

    let err = state
        .members
        .add_members(alice.id(), chat.id, &[carol.id(), Uuid::now_v7()])
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(state.members.list_members(alice.id(), chat.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn only_the_owner_manages_members() {
    let state = test_state();
    let alice = create_user(&state).await;
    let bob = create_user(&state).await;
    let carol = create_user(&state).await;
    let chat = create_group(&state, &alice, &[&bob]).await;

    let add = state
        .members
        .add_members(bob.id(), chat.id, &[carol.id()])
        .await
        .unwrap_err();
    let remove = state
        .members
        .remove_members(bob.id(), chat.id, &[alice.id()])
        .await
        .unwrap_err();

    assert!(matches!(add, AppError::Forbidden(_)));
    assert!(matches!(remove, AppError::Forbidden(_)));
}

#[tokio::test]
async fn private_chat_membership_is_fixed() {
    let state = test_state();
    let alice = create_user(&state).await;
    let bob = create_user(&state).await;
    let carol = create_user(&state).await;
    let chat = create_private(&state, &alice, &bob).await;

    let err = state
        .members
        .add_members(alice.id(), chat.id, &[carol.id()])
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn remove_members_twice_is_a_no_op() {
    let state = test_state();
    let alice = create_user(&state).await;
    let bob = create_user(&state).await;
    let carol = create_user(&state).await;
    let chat = create_group(&state, &alice, &[&bob, &carol]).await;

    state
        .members
        .remove_members(alice.id(), chat.id, &[bob.id()])
        .await
        .unwrap();
    state
        .members
        .remove_members(alice.id(), chat.id, &[bob.id()])
        .await
        .unwrap();

    let members = state.members.list_members(alice.id(), chat.id).await.unwrap();
    assert_eq!(members.len(), 2);
    assert!(matches!(
        state.members.ensure_access(bob.id(), chat.id).await,
        Err(AppError::Forbidden(_))
    ));
}

#[tokio::test]
async fn owner_cannot_be_removed() {
    let state = test_state();
    let alice = create_user(&state).await;
    let bob = create_user(&state).await;
    let chat = create_group(&state, &alice, &[&bob]).await;

    let err = state
        .members
        .remove_members(alice.id(), chat.id, &[bob.id(), alice.id()])
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
    // The batch is all-or-nothing
    assert!(state.members.ensure_access(bob.id(), chat.id).await.is_ok());
}

#[tokio::test]
async fn member_can_leave() {
    let state = test_state();
    let alice = create_user(&state).await;
    let bob = create_user(&state).await;
    let chat = create_group(&state, &alice, &[&bob]).await;

    state.members.leave_chat(bob.id(), chat.id).await.unwrap();

    assert!(state.chats.get_all_chats(bob.id()).await.unwrap().is_empty());
    let again = state.members.leave_chat(bob.id(), chat.id).await.unwrap_err();
    assert!(matches!(again, AppError::NotFound(_)));
}

#[tokio::test]
async fn group_owner_cannot_leave() {
    let state = test_state();
    let alice = create_user(&state).await;
    let bob = create_user(&state).await;
    let chat = create_group(&state, &alice, &[&bob]).await;

    let err = state.members.leave_chat(alice.id(), chat.id).await.unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn either_side_can_leave_a_private_chat() {
    let state = test_state();
    let alice = create_user(&state).await;
    let bob = create_user(&state).await;
    let chat = create_private(&state, &alice, &bob).await;

    state.members.leave_chat(alice.id(), chat.id).await.unwrap();

    assert!(state.chats.get_all_chats(alice.id()).await.unwrap().is_empty());
    // A private chat without its counterpart is hidden and closed to new messages
    assert!(state.chats.get_all_chats(bob.id()).await.unwrap().is_empty());
    let err = state
        .messages
        .add_message(bob.id(), chat.id, "still there?")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "got {err:?}");
}

#[tokio::test]
async fn list_members_requires_access() {
    let state = test_state();
    let alice = create_user(&state).await;
    let bob = create_user(&state).await;
    let mallory = create_user(&state).await;
    let chat = create_group(&state, &alice, &[&bob]).await;

    let err = state
        .members
        .list_members(mallory.id(), chat.id)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn mark_read_clears_unread() {
    let state = test_state();
    let alice = create_user(&state).await;
    let bob = create_user(&state).await;
    let chat = create_group(&state, &alice, &[&bob]).await;
    post(&state, &bob, chat.id, "anyone here?").await;

    let before = state.chats.get_all_chats(alice.id()).await.unwrap();
    assert_eq!(before[0].unread_count, 1);

    let read = state.members.mark_read(alice.id(), chat.id, None).await.unwrap();
    assert_eq!(read.unread_count, 0);

    let after = state.chats.get_all_chats(alice.id()).await.unwrap();
    assert_eq!(after[0].unread_count, 0);
}

#[tokio::test]
async fn mark_read_up_to_a_message_leaves_later_ones_unread() {
    let state = test_state();
    let alice = create_user(&state).await;
    let bob = create_user(&state).await;
    let chat = create_group(&state, &alice, &[&bob]).await;
    post(&state, &alice, chat.id, "one").await;
    let second = post(&state, &alice, chat.id, "two").await;
    post(&state, &alice, chat.id, "three").await;

    let read = state
        .members
        .mark_read(bob.id(), chat.id, Some(second.created))
        .await
        .unwrap();

    assert_eq!(read.last_read, second.created);
    assert_eq!(read.unread_count, 1);
}

#[tokio::test]
async fn watermark_never_moves_back() {
    let state = test_state();
    let alice = create_user(&state).await;
    let bob = create_user(&state).await;
    let chat = create_group(&state, &alice, &[&bob]).await;
    let first = post(&state, &alice, chat.id, "one").await;
    let second = post(&state, &alice, chat.id, "two").await;

    state
        .members
        .mark_read(bob.id(), chat.id, Some(second.created))
        .await
        .unwrap();
    let read = state
        .members
        .mark_read(bob.id(), chat.id, Some(first.created))
        .await
        .unwrap();

    assert_eq!(read.last_read, second.created);
    assert_eq!(read.unread_count, 0);
    assert_eq!(
        state.members.last_read(bob.id(), chat.id).await.unwrap(),
        second.created
    );
}

#[tokio::test]
async fn mark_read_requires_access() {
    let state = test_state();
    let alice = create_user(&state).await;
    let bob = create_user(&state).await;
    let mallory = create_user(&state).await;
    let chat = create_group(&state, &alice, &[&bob]).await;

    let err = state
        .members
        .mark_read(mallory.id(), chat.id, None)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn watermark_never_passes_the_store_clock() {
    let state = test_state();
    let alice = create_user(&state).await;
    let bob = create_user(&state).await;
    let chat = create_group(&state, &alice, &[&bob]).await;

    state
        .members
        .mark_read(bob.id(), chat.id, Some(Utc::now() + TimeDelta::days(365)))
        .await
        .unwrap();
    let posted = state
        .messages
        .add_message(alice.id(), chat.id, "hi")
        .await
        .unwrap();

    assert_eq!(posted.deliveries.len(), 1);
    assert_eq!(posted.deliveries[0].recipient_unread_count, 1);
    assert_eq!(state.chats.get_all_chats(bob.id()).await.unwrap()[0].unread_count, 1);
}

#[tokio::test]
async fn reported_watermark_is_the_stored_one() {
    let state = test_state();
    let alice = create_user(&state).await;
    let bob = create_user(&state).await;
    let chat = create_group(&state, &alice, &[&bob]).await;

    let read = state
        .members
        .mark_read(bob.id(), chat.id, Some(Utc::now()))
        .await
        .unwrap();

    assert_eq!(
        read.last_read,
        state.members.last_read(bob.id(), chat.id).await.unwrap()
    );
    assert_eq!(read.last_read.timestamp_subsec_nanos() % 1_000, 0);
}
