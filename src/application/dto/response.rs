//! Response DTOs
//!
//! Plain result models handed to controllers and the real-time gateway.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{AuthoredMessage, Chat, Message, User};

/// User response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserView {
    pub id: Uuid,
    pub created: DateTime<Utc>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
}

impl UserView {
    /// Public shape: no login.
    pub fn public(user: User) -> Self {
        Self {
            id: user.id,
            created: user.created_at,
            name: user.name,
            login: None,
        }
    }

    /// Shape for the user themselves: includes the login.
    pub fn with_login(user: User) -> Self {
        Self {
            id: user.id,
            created: user.created_at,
            name: user.name,
            login: Some(user.login),
        }
    }
}

/// Message response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageView {
    pub id: Uuid,
    pub created: DateTime<Utc>,
    pub text: String,
    pub author_id: Uuid,
    pub author_name: String,
    pub chat_id: Uuid,
}

impl MessageView {
    pub fn new(message: Message, author_name: impl Into<String>) -> Self {
        Self {
            id: message.id,
            created: message.created_at,
            text: message.text,
            author_id: message.author_id,
            author_name: author_name.into(),
            chat_id: message.chat_id,
        }
    }
}

impl From<AuthoredMessage> for MessageView {
    fn from(record: AuthoredMessage) -> Self {
        Self::new(record.message, record.author_name)
    }
}

/// Chat response, as seen by one member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatView {
    pub id: Uuid,
    pub created: DateTime<Utc>,
    pub is_private: bool,
    /// Stored name for group chats, the counterpart's name for private chats
    pub name: String,
    pub owner_id: Uuid,
    pub last_message: Option<MessageView>,
    pub unread_count: i64,
}

impl ChatView {
    pub fn new(
        chat: Chat,
        display_name: String,
        last_message: Option<MessageView>,
        unread_count: i64,
    ) -> Self {
        Self {
            id: chat.id,
            created: chat.created_at,
            is_private: chat.is_private,
            name: display_name,
            owner_id: chat.owner_id,
            last_message,
            unread_count,
        }
    }
}

/// A new message addressed to one recipient, with their unread count
/// after the message was stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryView {
    pub message: MessageView,
    pub recipient_id: Uuid,
    pub recipient_unread_count: i64,
}

/// Read watermark response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadStateView {
    pub chat_id: Uuid,
    pub last_read: DateTime<Utc>,
    pub unread_count: i64,
}

/// Availability check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityView {
    pub used: bool,
}
