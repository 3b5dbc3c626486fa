//! Member Service
//!
//! Chat membership: access checks, owner-managed member lists, leaving and
//! the per-member read watermark.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use uuid::Uuid;

use super::access::{ensure_access, load_chat, load_owned_group_chat};
use crate::application::dto::{ReadStateView, UserView};
use crate::domain::{MemberRepository, MessageRepository, SessionFactory, UnitOfWork, UserRepository};
use crate::shared::error::AppError;
use crate::shared::validation::unique_ids;

/// Member service trait
#[async_trait]
pub trait MemberService: Send + Sync {
    /// Forbidden unless the user is a member of the chat
    async fn ensure_access(&self, user_id: Uuid, chat_id: Uuid) -> Result<(), AppError>;

    /// List the users of a chat the caller belongs to
    async fn list_members(&self, user_id: Uuid, chat_id: Uuid) -> Result<Vec<UserView>, AppError>;

    /// Add users to a group chat owned by the caller
    async fn add_members(&self, owner_id: Uuid, chat_id: Uuid, user_ids: &[Uuid]) -> Result<(), AppError>;

    /// Remove users from a group chat owned by the caller
    async fn remove_members(&self, owner_id: Uuid, chat_id: Uuid, user_ids: &[Uuid]) -> Result<(), AppError>;

    /// Leave a chat
    async fn leave_chat(&self, user_id: Uuid, chat_id: Uuid) -> Result<(), AppError>;

    /// Advance the caller's read watermark
    async fn mark_read(
        &self,
        user_id: Uuid,
        chat_id: Uuid,
        up_to: Option<DateTime<Utc>>,
    ) -> Result<ReadStateView, AppError>;

    /// The caller's read watermark
    async fn last_read(&self, user_id: Uuid, chat_id: Uuid) -> Result<DateTime<Utc>, AppError>;
}

/// MemberService implementation
pub struct MemberServiceImpl<S>
where
    S: SessionFactory,
{
    store: Arc<S>,
}

impl<S> MemberServiceImpl<S>
where
    S: SessionFactory,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S> MemberService for MemberServiceImpl<S>
where
    S: SessionFactory,
{
    async fn ensure_access(&self, user_id: Uuid, chat_id: Uuid) -> Result<(), AppError> {
        let mut tx = self.store.begin().await?;
        ensure_access(&mut tx, user_id, chat_id).await?;
        Ok(())
    }

    async fn list_members(&self, user_id: Uuid, chat_id: Uuid) -> Result<Vec<UserView>, AppError> {
        let mut tx = self.store.begin().await?;
        ensure_access(&mut tx, user_id, chat_id).await?;

        let users = tx.find_member_users(chat_id).await?;
        Ok(users.into_iter().map(UserView::public).collect())
    }

    async fn add_members(&self, owner_id: Uuid, chat_id: Uuid, user_ids: &[Uuid]) -> Result<(), AppError> {
        tracing::debug!(owner_id = %owner_id, chat_id = %chat_id, count = user_ids.len(), "Adding members");

        let mut tx = self.store.begin().await?;
        load_owned_group_chat(&mut tx, owner_id, chat_id).await?;

        let mut added = 0usize;
        for user_id in unique_ids(user_ids) {
            if tx.find_user(user_id).await?.is_none() {
                return Err(AppError::NotFound(format!("User {} not found", user_id)));
            }
            // Existing members are skipped; the unique (chat, user) pair backs this up
            if tx.insert_member(chat_id, user_id).await?.is_some() {
                added += 1;
            }
        }
        tx.commit().await?;

        tracing::info!(chat_id = %chat_id, added, "Members added");
        Ok(())
    }

    async fn remove_members(&self, owner_id: Uuid, chat_id: Uuid, user_ids: &[Uuid]) -> Result<(), AppError> {
        tracing::debug!(owner_id = %owner_id, chat_id = %chat_id, count = user_ids.len(), "Removing members");

        let mut tx = self.store.begin().await?;
        load_owned_group_chat(&mut tx, owner_id, chat_id).await?;

        for user_id in unique_ids(user_ids) {
            if user_id == owner_id {
                return Err(AppError::Conflict(
                    "The owner can't be removed from their own chat".into(),
                ));
            }
            if !tx.delete_member(chat_id, user_id).await? {
                tracing::info!(chat_id = %chat_id, user_id = %user_id, "Member already absent");
            }
        }
        tx.commit().await?;

        tracing::info!(chat_id = %chat_id, "Members removed");
        Ok(())
    }

    async fn leave_chat(&self, user_id: Uuid, chat_id: Uuid) -> Result<(), AppError> {
        let mut tx = self.store.begin().await?;
        let chat = load_chat(&mut tx, chat_id).await?;

        if tx.find_member(chat_id, user_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "User {} is not a member of chat {}",
                user_id, chat_id
            )));
        }
        if !chat.is_private && chat.is_owned_by(user_id) {
            return Err(AppError::Conflict(
                "The owner can't leave a group chat; transfer ownership first".into(),
            ));
        }

        tx.delete_member(chat_id, user_id).await?;
        tx.commit().await?;

        tracing::info!(chat_id = %chat_id, user_id = %user_id, "User left chat");
        Ok(())
    }

    async fn mark_read(
        &self,
        user_id: Uuid,
        chat_id: Uuid,
        up_to: Option<DateTime<Utc>>,
    ) -> Result<ReadStateView, AppError> {
        let mut tx = self.store.begin().await?;
        let member = ensure_access(&mut tx, user_id, chat_id).await?;

        // Never past the store clock, at the precision the store keeps
        let now = tx.now().await?;
        let requested = up_to.map_or(now, |up_to| up_to.min(now)).trunc_subsecs(6);
        let last_read = member.last_read_at.max(requested);
        if last_read > member.last_read_at {
            tx.update_last_read(chat_id, user_id, last_read).await?;
        }

        let unread_count: i64 = tx
            .count_unread_for_user(user_id, &[chat_id])
            .await?
            .into_iter()
            .map(|(_, count)| count)
            .sum();
        tx.commit().await?;

        tracing::debug!(chat_id = %chat_id, user_id = %user_id, unread_count, "Watermark advanced");
        Ok(ReadStateView {
            chat_id,
            last_read,
            unread_count,
        })
    }

    async fn last_read(&self, user_id: Uuid, chat_id: Uuid) -> Result<DateTime<Utc>, AppError> {
        let mut tx = self.store.begin().await?;
        let member = ensure_access(&mut tx, user_id, chat_id).await?;

        Ok(member.last_read_at)
    }
}
