//! Access guards shared by the chat, member and message services.
//!
//! They run inside the caller's unit of work so the checks and the writes
//! that depend on them see the same state.

use uuid::Uuid;

use crate::domain::{Chat, ChatRepository, Member, MemberRepository};
use crate::shared::error::AppError;

/// Forbidden unless `user_id` is a member of `chat_id`.
pub async fn ensure_access<T>(tx: &mut T, user_id: Uuid, chat_id: Uuid) -> Result<Member, AppError>
where
    T: MemberRepository + ?Sized,
{
    tx.find_member(chat_id, user_id).await?.ok_or_else(|| {
        AppError::Forbidden(format!("User {} has no access to chat {}", user_id, chat_id))
    })
}

/// Load a chat or fail with NotFound.
pub async fn load_chat<T>(tx: &mut T, chat_id: Uuid) -> Result<Chat, AppError>
where
    T: ChatRepository + ?Sized,
{
    tx.find_chat(chat_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Chat {} not found", chat_id)))
}

/// Load a group chat the caller owns.
///
/// NotFound if the chat is missing, Forbidden if the caller is not its owner,
/// Conflict if it is private.
pub async fn load_owned_group_chat<T>(tx: &mut T, owner_id: Uuid, chat_id: Uuid) -> Result<Chat, AppError>
where
    T: ChatRepository + ?Sized,
{
    let chat = load_chat(tx, chat_id).await?;

    if !chat.is_owned_by(owner_id) {
        return Err(AppError::Forbidden(format!(
            "User {} is not the owner of chat {}",
            owner_id, chat_id
        )));
    }
    if chat.is_private {
        return Err(AppError::Conflict(format!("Chat {} is private", chat_id)));
    }

    Ok(chat)
}
