//! Message Service
//!
//! Posting messages and reading chat history. Posting also works out, for
//! each other member, the unread count the push channel should report.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::access::{ensure_access, load_chat};
use crate::application::dto::{DeliveryView, MessageView};
use crate::domain::{
    MemberRepository, MessageRepository, NewMessage, PageDirection, SessionFactory, UnitOfWork,
    UserRepository,
};
use crate::shared::error::AppError;
use crate::shared::validation::{require_content, MAX_MESSAGE_LENGTH};

/// Message service trait
#[async_trait]
pub trait MessageService: Send + Sync {
    /// Post a message to a chat the author belongs to
    async fn add_message(&self, author_id: Uuid, chat_id: Uuid, text: &str) -> Result<PostedMessage, AppError>;

    /// Page through history on one side of `skip` (default: now)
    async fn get_messages(
        &self,
        user_id: Uuid,
        chat_id: Uuid,
        skip: Option<DateTime<Utc>>,
        take: i64,
        direction: PageDirection,
    ) -> Result<Vec<MessageView>, AppError>;

    /// History around the caller's read watermark
    async fn get_around_unread(&self, user_id: Uuid, chat_id: Uuid, take: i64) -> Result<Vec<MessageView>, AppError>;
}

/// A stored message and the deliveries it produced.
#[derive(Debug, Clone)]
pub struct PostedMessage {
    pub message: MessageView,
    /// One entry per other member with a watermark older than the message
    pub deliveries: Vec<DeliveryView>,
}

/// MessageService implementation
pub struct MessageServiceImpl<S>
where
    S: SessionFactory,
{
    store: Arc<S>,
    max_take: i64,
}

impl<S> MessageServiceImpl<S>
where
    S: SessionFactory,
{
    pub fn new(store: Arc<S>, max_take: i64) -> Self {
        Self { store, max_take }
    }

    fn page_size(&self, take: i64) -> Result<i64, AppError> {
        if take <= 0 {
            return Err(AppError::Validation("take must be greater than zero".into()));
        }
        Ok(take.min(self.max_take))
    }
}

#[async_trait]
impl<S> MessageService for MessageServiceImpl<S>
where
    S: SessionFactory,
{
    async fn add_message(&self, author_id: Uuid, chat_id: Uuid, text: &str) -> Result<PostedMessage, AppError> {
        let text = require_content("Text", text, MAX_MESSAGE_LENGTH)?;

        let mut tx = self.store.begin().await?;
        ensure_access(&mut tx, author_id, chat_id).await?;
        let chat = load_chat(&mut tx, chat_id).await?;
        if chat.is_private && tx.find_members(chat_id).await?.len() < 2 {
            return Err(AppError::Conflict(format!(
                "The other member has left private chat {}",
                chat_id
            )));
        }
        let author = tx
            .find_user(author_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", author_id)))?;

        let message = tx
            .insert_message(NewMessage {
                text: text.to_string(),
                author_id,
                chat_id,
            })
            .await?;
        let created_at = message.created_at;
        let view = MessageView::new(message, author.name);

        let deliveries = tx
            .count_unread_by_member(chat_id)
            .await?
            .into_iter()
            .filter(|m| m.user_id != author_id && m.last_read_at < created_at)
            .map(|m| DeliveryView {
                message: view.clone(),
                recipient_id: m.user_id,
                recipient_unread_count: m.unread,
            })
            .collect::<Vec<_>>();
        tx.commit().await?;

        tracing::info!(
            message_id = %view.id,
            chat_id = %chat_id,
            author_id = %author_id,
            recipients = deliveries.len(),
            "Message created"
        );

        Ok(PostedMessage {
            message: view,
            deliveries,
        })
    }

    async fn get_messages(
        &self,
        user_id: Uuid,
        chat_id: Uuid,
        skip: Option<DateTime<Utc>>,
        take: i64,
        direction: PageDirection,
    ) -> Result<Vec<MessageView>, AppError> {
        let take = self.page_size(take)?;

        let mut tx = self.store.begin().await?;
        ensure_access(&mut tx, user_id, chat_id).await?;

        // Without a pivot the page ends at now, inclusive of rows stamped this instant
        let (pivot, inclusive) = match skip {
            Some(skip) => (skip, false),
            None => (tx.now().await?, true),
        };
        let messages = tx.find_messages(chat_id, pivot, direction, inclusive, take).await?;

        Ok(messages.into_iter().map(MessageView::from).collect())
    }

    async fn get_around_unread(&self, user_id: Uuid, chat_id: Uuid, take: i64) -> Result<Vec<MessageView>, AppError> {
        let take = self.page_size(take)?;

        let mut tx = self.store.begin().await?;
        let member = ensure_access(&mut tx, user_id, chat_id).await?;
        let watermark = member.last_read_at;

        let mut messages = tx
            .find_messages(chat_id, watermark, PageDirection::Newer, false, take / 2)
            .await?;
        let remaining = take - messages.len() as i64;
        if remaining > 0 {
            let read = tx
                .find_messages(chat_id, watermark, PageDirection::Older, true, remaining)
                .await?;
            messages.extend(read);
        }

        tracing::debug!(chat_id = %chat_id, user_id = %user_id, count = messages.len(), "Loaded messages around watermark");
        Ok(messages.into_iter().map(MessageView::from).collect())
    }
}
