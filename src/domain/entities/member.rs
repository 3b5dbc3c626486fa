//! Chat Member entity and repository trait.
//!
//! Maps to the `members` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::User;
use crate::shared::error::AppError;

/// Represents a user's membership in a chat.
///
/// Maps to the `members` table:
/// - id: UUID PRIMARY KEY
/// - chat_id: UUID NOT NULL REFERENCES chats(id) ON DELETE CASCADE
/// - user_id: UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE
/// - last_read_at: TIMESTAMPTZ NOT NULL (defaults to join time)
/// - created_at: TIMESTAMPTZ NOT NULL
///
/// `(chat_id, user_id)` is unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    /// Primary key
    pub id: Uuid,

    /// Chat ID
    pub chat_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Read watermark: messages created strictly after it are unread
    pub last_read_at: DateTime<Utc>,

    /// When the user joined the chat
    pub created_at: DateTime<Utc>,
}

impl Member {
    /// Whether a message created at `created_at` by `author_id` is unread for this member.
    ///
    /// A member's own messages never count as unread for them.
    pub fn is_unread(&self, created_at: DateTime<Utc>, author_id: Uuid) -> bool {
        author_id != self.user_id && created_at > self.last_read_at
    }
}

/// Unread count of one member of a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberUnread {
    pub user_id: Uuid,
    pub last_read_at: DateTime<Utc>,
    pub unread: i64,
}

/// Repository trait for Member data access operations.
#[async_trait]
pub trait MemberRepository: Send {
    /// Find a member by chat and user ID.
    async fn find_member(&mut self, chat_id: Uuid, user_id: Uuid) -> Result<Option<Member>, AppError>;

    /// Find all members of a chat.
    async fn find_members(&mut self, chat_id: Uuid) -> Result<Vec<Member>, AppError>;

    /// Find the users behind every member of a chat.
    async fn find_member_users(&mut self, chat_id: Uuid) -> Result<Vec<User>, AppError>;

    /// For each of `chat_ids`, the name of a member other than `user_id`.
    ///
    /// Used to name private chats after the counterpart.
    async fn find_counterpart_names(
        &mut self,
        user_id: Uuid,
        chat_ids: &[Uuid],
    ) -> Result<Vec<(Uuid, String)>, AppError>;

    /// Add a user to a chat with the watermark at join time.
    ///
    /// Returns `None` without failing when the pair already exists.
    async fn insert_member(&mut self, chat_id: Uuid, user_id: Uuid) -> Result<Option<Member>, AppError>;

    /// Remove a user from a chat. Returns whether a row was removed.
    async fn delete_member(&mut self, chat_id: Uuid, user_id: Uuid) -> Result<bool, AppError>;

    /// Set the read watermark of a member.
    async fn update_last_read(
        &mut self,
        chat_id: Uuid,
        user_id: Uuid,
        last_read_at: DateTime<Utc>,
    ) -> Result<(), AppError>;
}
