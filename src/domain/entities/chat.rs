//! Chat entity and repository trait.
//!
//! Maps to the `chats` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::AppError;

/// A place for a conversation between users.
///
/// Maps to the `chats` table:
/// - id: UUID PRIMARY KEY
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp()
/// - is_private: BOOLEAN NOT NULL
/// - name: VARCHAR(200) NULL (always NULL for private chats)
/// - owner_id: UUID NOT NULL REFERENCES users(id)
///
/// A private chat has exactly two members and no name. A group chat has a
/// non-empty name and an owner who manages its membership.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    /// Primary key
    pub id: Uuid,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Private (1:1) chat flag
    pub is_private: bool,

    /// Stored name, `None` for private chats
    pub name: Option<String>,

    /// Owner user id
    pub owner_id: Uuid,
}

impl Chat {
    /// Check if the given user owns this chat.
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }
}

/// Fields required to insert a chat.
#[derive(Debug, Clone)]
pub struct NewChat {
    pub is_private: bool,
    pub name: Option<String>,
    pub owner_id: Uuid,
}

/// Repository trait for Chat data access operations.
#[async_trait]
pub trait ChatRepository: Send {
    /// Find a chat by id.
    async fn find_chat(&mut self, id: Uuid) -> Result<Option<Chat>, AppError>;

    /// Find every chat the user is a member of.
    async fn find_chats_for_user(&mut self, user_id: Uuid) -> Result<Vec<Chat>, AppError>;

    /// Count chats owned by a user.
    async fn count_chats_owned_by(&mut self, user_id: Uuid) -> Result<i64, AppError>;

    /// Insert a new chat (members are added separately).
    async fn insert_chat(&mut self, chat: NewChat) -> Result<Chat, AppError>;

    /// Persist name and owner of an existing chat.
    async fn update_chat(&mut self, chat: &Chat) -> Result<(), AppError>;

    /// Delete a chat. Members and messages cascade.
    async fn delete_chat(&mut self, id: Uuid) -> Result<(), AppError>;
}
