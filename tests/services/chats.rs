//! Chat registry tests

use pretty_assertions::assert_eq;
use test_case::test_case;
use uuid::Uuid;

use chat_hub::application::services::{ChatService, CreateChatDto, MemberService};
use chat_hub::shared::AppError;

use crate::common::*;

fn group(name: Option<&str>, member_ids: Vec<Uuid>) -> CreateChatDto {
    CreateChatDto {
        name: name.map(str::to_string),
        member_ids,
        is_private: false,
    }
}

#[tokio::test]
async fn private_chat_is_named_after_the_counterpart() {
    let state = test_state();
    let alice = create_user(&state).await;
    let bob = create_user(&state).await;

    let created = create_private(&state, &alice, &bob).await;
    assert_eq!(created.name, bob.name());
    assert!(created.is_private);

    let seen_by_alice = state.chats.get_all_chats(alice.id()).await.unwrap();
    let seen_by_bob = state.chats.get_all_chats(bob.id()).await.unwrap();

    assert_eq!(seen_by_alice.len(), 1);
    assert_eq!(seen_by_alice[0].name, bob.name());
    assert_eq!(seen_by_bob.len(), 1);
    assert_eq!(seen_by_bob[0].name, alice.name());
}

#[tokio::test]
async fn private_chat_cannot_be_renamed_or_handed_over() {
    let state = test_state();
    let alice = create_user(&state).await;
    let bob = create_user(&state).await;
    let chat = create_private(&state, &alice, &bob).await;

    let rename = state
        .chats
        .rename_chat(alice.id(), chat.id, "Secret")
        .await
        .unwrap_err();
    let hand_over = state
        .chats
        .change_owner(alice.id(), chat.id, bob.id())
        .await
        .unwrap_err();
    let remove = state.chats.remove_chat(alice.id(), chat.id).await.unwrap_err();

    assert!(matches!(rename, AppError::Conflict(_)), "got {rename:?}");
    assert!(matches!(hand_over, AppError::Conflict(_)), "got {hand_over:?}");
    assert!(matches!(remove, AppError::Conflict(_)), "got {remove:?}");
}

#[tokio::test]
async fn private_chat_takes_exactly_one_other_member() {
    let state = test_state();
    let alice = create_user(&state).await;
    let bob = create_user(&state).await;
    let carol = create_user(&state).await;

    let err = state
        .chats
        .create_chat(
            alice.id(),
            CreateChatDto {
                name: None,
                member_ids: vec![bob.id(), carol.id()],
                is_private: true,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
}

#[test_case(None ; "missing name")]
#[test_case(Some("   ") ; "blank name")]
#[tokio::test]
async fn group_chat_needs_a_name(name: Option<&str>) {
    let state = test_state();
    let alice = create_user(&state).await;
    let bob = create_user(&state).await;

    let err = state
        .chats
        .create_chat(alice.id(), group(name, vec![bob.id()]))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn empty_member_list_is_rejected() {
    let state = test_state();
    let alice = create_user(&state).await;

    let err = state
        .chats
        .create_chat(alice.id(), group(Some("Team"), vec![]))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn chat_with_only_the_creator_is_not_found() {
    let state = test_state();
    let alice = create_user(&state).await;

    let err = state
        .chats
        .create_chat(alice.id(), group(Some("Team"), vec![alice.id()]))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)), "got {err:?}");
    assert!(state.chats.get_all_chats(alice.id()).await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_member_ids_are_skipped_when_one_resolves() {
    let state = test_state();
    let alice = create_user(&state).await;
    let bob = create_user(&state).await;

    let chat = state
        .chats
        .create_chat(
            alice.id(),
            group(Some("Team"), vec![bob.id(), Uuid::now_v7(), bob.id(), alice.id()]),
        )
        .await
        .unwrap();

    let members = state.members.list_members(alice.id(), chat.id).await.unwrap();
    let mut ids: Vec<Uuid> = members.iter().map(|m| m.id).collect();
    ids.sort();
    let mut expected = vec![alice.id(), bob.id()];
    expected.sort();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn new_chat_has_no_unread_and_no_last_message() {
    let state = test_state();
    let alice = create_user(&state).await;
    let bob = create_user(&state).await;

    let chat = create_group(&state, &alice, &[&bob]).await;

    assert_eq!(chat.unread_count, 0);
    assert_eq!(chat.last_message, None);
    assert_eq!(chat.owner_id, alice.id());
}

#[tokio::test]
async fn listing_shows_last_message_and_unread_count() {
    let state = test_state();
    let alice = create_user(&state).await;
    let bob = create_user(&state).await;
    let chat = create_group(&state, &alice, &[&bob]).await;
    post(&state, &alice, chat.id, "first").await;
    post(&state, &alice, chat.id, "second").await;

    let bobs = state.chats.get_all_chats(bob.id()).await.unwrap();
    let alices = state.chats.get_all_chats(alice.id()).await.unwrap();

    assert_eq!(bobs[0].unread_count, 2);
    assert_eq!(bobs[0].last_message.as_ref().map(|m| m.text.as_str()), Some("second"));
    // Own messages never count as unread
    assert_eq!(alices[0].unread_count, 0);
}

#[tokio::test]
async fn user_without_chats_gets_an_empty_list() {
    let state = test_state();
    let alice = create_user(&state).await;

    assert!(state.chats.get_all_chats(alice.id()).await.unwrap().is_empty());
}

#[tokio::test]
async fn get_chat_requires_membership() {
    let state = test_state();
    let alice = create_user(&state).await;
    let bob = create_user(&state).await;
    let mallory = create_user(&state).await;
    let chat = create_group(&state, &alice, &[&bob]).await;

    let forbidden = state.chats.get_chat(mallory.id(), chat.id).await.unwrap_err();
    let missing = state.chats.get_chat(alice.id(), Uuid::now_v7()).await.unwrap_err();

    assert!(matches!(forbidden, AppError::Forbidden(_)));
    assert!(matches!(missing, AppError::NotFound(_)));
    assert_eq!(state.chats.get_chat(bob.id(), chat.id).await.unwrap().id, chat.id);
}

#[tokio::test]
async fn only_the_owner_renames() {
    let state = test_state();
    let alice = create_user(&state).await;
    let bob = create_user(&state).await;
    let chat = create_group(&state, &alice, &[&bob]).await;

    let err = state
        .chats
        .rename_chat(bob.id(), chat.id, "Mine now")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    state
        .chats
        .rename_chat(alice.id(), chat.id, "  Renamed  ")
        .await
        .unwrap();
    let view = state.chats.get_chat(bob.id(), chat.id).await.unwrap();
    assert_eq!(view.name, "Renamed");
}

#[tokio::test]
async fn rename_missing_chat_is_not_found() {
    let state = test_state();
    let alice = create_user(&state).await;

    let err = state
        .chats
        .rename_chat(alice.id(), Uuid::now_v7(), "Name")
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn change_owner_moves_owner_rights() {
    let state = test_state();
    let alice = create_user(&state).await;
    let bob = create_user(&state).await;
    let chat = create_group(&state, &alice, &[&bob]).await;

    state.chats.change_owner(alice.id(), chat.id, bob.id()).await.unwrap();

    let err = state
        .chats
        .rename_chat(alice.id(), chat.id, "Old owner")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    state
        .chats
        .rename_chat(bob.id(), chat.id, "New owner")
        .await
        .unwrap();
}

#[tokio::test]
async fn change_owner_to_unknown_user_is_not_found() {
    let state = test_state();
    let alice = create_user(&state).await;
    let bob = create_user(&state).await;
    let chat = create_group(&state, &alice, &[&bob]).await;

    let err = state
        .chats
        .change_owner(alice.id(), chat.id, Uuid::now_v7())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
}

// Only the new owner's existence is checked; a non-member can be made owner.
#[tokio::test]
async fn change_owner_accepts_a_non_member() {
    let state = test_state();
    let alice = create_user(&state).await;
    let bob = create_user(&state).await;
    let outsider = create_user(&state).await;
    let chat = create_group(&state, &alice, &[&bob]).await;

    state
        .chats
        .change_owner(alice.id(), chat.id, outsider.id())
        .await
        .unwrap();

    let view = state.chats.get_chat(bob.id(), chat.id).await.unwrap();
    assert_eq!(view.owner_id, outsider.id());
    assert!(matches!(
        state.chats.get_chat(outsider.id(), chat.id).await,
        Err(AppError::Forbidden(_))
    ));
}

#[tokio::test]
async fn remove_chat_cascades() {
    let state = test_state();
    let alice = create_user(&state).await;
    let bob = create_user(&state).await;
    let chat = create_group(&state, &alice, &[&bob]).await;
    post(&state, &bob, chat.id, "hello").await;

    let err = state.chats.remove_chat(bob.id(), chat.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    state.chats.remove_chat(alice.id(), chat.id).await.unwrap();

    assert!(state.chats.get_all_chats(bob.id()).await.unwrap().is_empty());
    assert!(matches!(
        state.chats.get_chat(alice.id(), chat.id).await,
        Err(AppError::NotFound(_))
    ));
}
