//! Chat Service
//!
//! Creates, lists, renames, transfers and removes chats. A private chat is
//! shown to each participant under the other participant's name.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use super::access::{ensure_access, load_chat, load_owned_group_chat};
use crate::application::dto::{ChatView, MessageView};
use crate::domain::{
    Chat, ChatRepository, MemberRepository, MessageRepository, NewChat, SessionFactory, UnitOfWork,
    UserRepository,
};
use crate::shared::error::AppError;
use crate::shared::validation::{require_text, unique_ids, MAX_NAME_LENGTH};

/// Chat service trait
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Create a private or group chat owned by the creator
    async fn create_chat(&self, creator_id: Uuid, request: CreateChatDto) -> Result<ChatView, AppError>;

    /// Every chat the user belongs to, with last message and unread count
    async fn get_all_chats(&self, user_id: Uuid) -> Result<Vec<ChatView>, AppError>;

    /// A single chat the user belongs to
    async fn get_chat(&self, user_id: Uuid, chat_id: Uuid) -> Result<ChatView, AppError>;

    /// Rename a group chat
    async fn rename_chat(&self, owner_id: Uuid, chat_id: Uuid, name: &str) -> Result<(), AppError>;

    /// Transfer ownership of a group chat
    async fn change_owner(&self, owner_id: Uuid, chat_id: Uuid, new_owner_id: Uuid) -> Result<(), AppError>;

    /// Delete a group chat with its members and messages
    async fn remove_chat(&self, owner_id: Uuid, chat_id: Uuid) -> Result<(), AppError>;
}

/// Create chat request
#[derive(Debug, Clone)]
pub struct CreateChatDto {
    pub name: Option<String>,
    pub member_ids: Vec<Uuid>,
    pub is_private: bool,
}

/// ChatService implementation
pub struct ChatServiceImpl<S>
where
    S: SessionFactory,
{
    store: Arc<S>,
}

impl<S> ChatServiceImpl<S>
where
    S: SessionFactory,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Build the views of `chats` as seen by `user_id`.
    ///
    /// Private chats without a counterpart are left out and their ids
    /// returned separately.
    async fn describe(
        tx: &mut S::Session,
        user_id: Uuid,
        chats: Vec<Chat>,
    ) -> Result<(Vec<ChatView>, Vec<Uuid>), AppError> {
        let chat_ids: Vec<Uuid> = chats.iter().map(|c| c.id).collect();
        let private_ids: Vec<Uuid> = chats.iter().filter(|c| c.is_private).map(|c| c.id).collect();

        let counterparts: HashMap<Uuid, String> = if private_ids.is_empty() {
            HashMap::new()
        } else {
            tx.find_counterpart_names(user_id, &private_ids).await?.into_iter().collect()
        };
        let mut last_messages: HashMap<Uuid, MessageView> = tx
            .find_last_messages(&chat_ids)
            .await?
            .into_iter()
            .map(|m| (m.message.chat_id, MessageView::from(m)))
            .collect();
        let unread: HashMap<Uuid, i64> = tx
            .count_unread_for_user(user_id, &chat_ids)
            .await?
            .into_iter()
            .collect();

        let mut views = Vec::with_capacity(chats.len());
        let mut orphans = Vec::new();
        for chat in chats {
            let name = if chat.is_private {
                match counterparts.get(&chat.id) {
                    Some(name) => name.clone(),
                    None => {
                        orphans.push(chat.id);
                        continue;
                    }
                }
            } else {
                chat.name.clone().unwrap_or_default()
            };

            let last_message = last_messages.remove(&chat.id);
            let unread_count = unread.get(&chat.id).copied().unwrap_or(0);
            views.push(ChatView::new(chat, name, last_message, unread_count));
        }

        Ok((views, orphans))
    }
}

#[async_trait]
impl<S> ChatService for ChatServiceImpl<S>
where
    S: SessionFactory,
{
    async fn create_chat(&self, creator_id: Uuid, request: CreateChatDto) -> Result<ChatView, AppError> {
        if request.member_ids.is_empty() {
            return Err(AppError::Validation("At least one member is required".into()));
        }
        if request.is_private && request.member_ids.len() > 1 {
            return Err(AppError::Validation(
                "A private chat takes exactly one other member".into(),
            ));
        }
        let name = if request.is_private {
            None
        } else {
            let name = request.name.as_deref().unwrap_or_default();
            Some(require_text("Name", name, MAX_NAME_LENGTH)?.to_string())
        };

        tracing::debug!(creator_id = %creator_id, is_private = request.is_private, "Creating chat");

        let member_ids: Vec<Uuid> = unique_ids(&request.member_ids)
            .into_iter()
            .filter(|id| *id != creator_id)
            .collect();

        let mut tx = self.store.begin().await?;
        if tx.find_user(creator_id).await?.is_none() {
            return Err(AppError::NotFound(format!("User {} not found", creator_id)));
        }
        let members = tx.find_users(&member_ids).await?;
        if members.is_empty() {
            return Err(AppError::NotFound("None of the given members exist".into()));
        }

        let chat = tx
            .insert_chat(NewChat {
                is_private: request.is_private,
                name,
                owner_id: creator_id,
            })
            .await?;
        tx.insert_member(chat.id, creator_id).await?;
        for member in &members {
            tx.insert_member(chat.id, member.id).await?;
        }
        tx.commit().await?;

        let display_name = if chat.is_private {
            members[0].name.clone()
        } else {
            chat.name.clone().unwrap_or_default()
        };

        tracing::info!(chat_id = %chat.id, members = members.len() + 1, "Chat created");
        Ok(ChatView::new(chat, display_name, None, 0))
    }

    async fn get_all_chats(&self, user_id: Uuid) -> Result<Vec<ChatView>, AppError> {
        let mut tx = self.store.begin().await?;
        let chats = tx.find_chats_for_user(user_id).await?;
        if chats.is_empty() {
            return Ok(Vec::new());
        }

        let (views, orphans) = Self::describe(&mut tx, user_id, chats).await?;
        for chat_id in orphans {
            tracing::warn!(chat_id = %chat_id, user_id = %user_id, "Private chat has no counterpart");
        }

        Ok(views)
    }

    async fn get_chat(&self, user_id: Uuid, chat_id: Uuid) -> Result<ChatView, AppError> {
        let mut tx = self.store.begin().await?;
        let chat = load_chat(&mut tx, chat_id).await?;
        ensure_access(&mut tx, user_id, chat_id).await?;

        let (mut views, _) = Self::describe(&mut tx, user_id, vec![chat]).await?;
        views
            .pop()
            .ok_or_else(|| AppError::NotFound(format!("Counterpart of private chat {} not found", chat_id)))
    }

    async fn rename_chat(&self, owner_id: Uuid, chat_id: Uuid, name: &str) -> Result<(), AppError> {
        let name = require_text("Name", name, MAX_NAME_LENGTH)?;

        let mut tx = self.store.begin().await?;
        let mut chat = load_owned_group_chat(&mut tx, owner_id, chat_id).await?;
        chat.name = Some(name.to_string());
        tx.update_chat(&chat).await?;
        tx.commit().await?;

        tracing::info!(chat_id = %chat_id, "Chat renamed");
        Ok(())
    }

    async fn change_owner(&self, owner_id: Uuid, chat_id: Uuid, new_owner_id: Uuid) -> Result<(), AppError> {
        let mut tx = self.store.begin().await?;
        if tx.find_user(new_owner_id).await?.is_none() {
            return Err(AppError::NotFound(format!("User {} not found", new_owner_id)));
        }

        // Only existence of the new owner is checked, not membership
        let mut chat = load_owned_group_chat(&mut tx, owner_id, chat_id).await?;
        chat.owner_id = new_owner_id;
        tx.update_chat(&chat).await?;
        tx.commit().await?;

        tracing::info!(chat_id = %chat_id, new_owner_id = %new_owner_id, "Chat owner changed");
        Ok(())
    }

    async fn remove_chat(&self, owner_id: Uuid, chat_id: Uuid) -> Result<(), AppError> {
        let mut tx = self.store.begin().await?;
        load_owned_group_chat(&mut tx, owner_id, chat_id).await?;
        tx.delete_chat(chat_id).await?;
        tx.commit().await?;

        tracing::info!(chat_id = %chat_id, "Chat removed");
        Ok(())
    }
}
