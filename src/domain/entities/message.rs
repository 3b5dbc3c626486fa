//! Message entity and repository trait.
//!
//! Maps to the `messages` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::member::MemberUnread;
use crate::shared::error::AppError;

/// Represents a message in a chat.
///
/// Maps to the `messages` table:
/// - id: UUID PRIMARY KEY
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp()
/// - text: VARCHAR(3000) NOT NULL
/// - author_id: UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE
/// - chat_id: UUID NOT NULL REFERENCES chats(id) ON DELETE CASCADE
///
/// Messages are immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Primary key
    pub id: Uuid,

    /// Timestamp when message was sent
    pub created_at: DateTime<Utc>,

    /// Message text (up to 3000 characters)
    pub text: String,

    /// Author user ID
    pub author_id: Uuid,

    /// Chat ID where the message was sent
    pub chat_id: Uuid,
}

/// A message joined with its author's current name.
#[derive(Debug, Clone)]
pub struct AuthoredMessage {
    pub message: Message,
    pub author_name: String,
}

/// Fields required to insert a message.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub text: String,
    pub author_id: Uuid,
    pub chat_id: Uuid,
}

/// Which side of a pivot timestamp to page toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PageDirection {
    /// Messages created strictly before the pivot
    #[default]
    Older,
    /// Messages created strictly after the pivot
    Newer,
}

/// Repository trait for Message data access operations.
#[async_trait]
pub trait MessageRepository: Send {
    /// Insert a new message.
    async fn insert_message(&mut self, message: NewMessage) -> Result<Message, AppError>;

    /// The most recent message of each of `chat_ids` that has any.
    async fn find_last_messages(&mut self, chat_ids: &[Uuid]) -> Result<Vec<AuthoredMessage>, AppError>;

    /// Unread counts of `user_id` in each of `chat_ids` with at least one unread message.
    async fn count_unread_for_user(
        &mut self,
        user_id: Uuid,
        chat_ids: &[Uuid],
    ) -> Result<Vec<(Uuid, i64)>, AppError>;

    /// Unread count of every member of a chat.
    async fn count_unread_by_member(&mut self, chat_id: Uuid) -> Result<Vec<MemberUnread>, AppError>;

    /// Page through a chat's history.
    ///
    /// Returns the `limit` messages adjacent to `pivot` on the requested side,
    /// ordered newest first. With `inclusive`, a message created exactly at
    /// the pivot belongs to the `Older` side.
    async fn find_messages(
        &mut self,
        chat_id: Uuid,
        pivot: DateTime<Utc>,
        direction: PageDirection,
        inclusive: bool,
        limit: i64,
    ) -> Result<Vec<AuthoredMessage>, AppError>;
}
