//! Request DTOs
//!
//! Data structures for API request bodies and query strings.
//!
//! Blank-string checks are left to the services so that the same rule
//! applies whichever surface calls them; these types only bound lengths
//! and shapes.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::domain::PageDirection;

/// Registration request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(max = 200, message = "Name must be at most 200 characters"))]
    pub name: String,

    #[validate(length(max = 200, message = "Login must be at most 200 characters"))]
    pub login: String,

    #[validate(length(min = 1, message = "Secret key is required"))]
    pub secret_key: String,
}

/// Update current user request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(max = 200, message = "Name must be at most 200 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 200, message = "Login must be at most 200 characters"))]
    pub login: Option<String>,

    pub secret_key: Option<String>,
}

/// Remove users request
#[derive(Debug, Deserialize, Validate)]
pub struct RemoveUsersRequest {
    #[validate(length(min = 1, message = "At least one user id is required"))]
    pub ids: Vec<Uuid>,
}

/// User search query
#[derive(Debug, Deserialize)]
pub struct UserSearchQuery {
    pub search: Option<String>,
}

/// Name/login availability query
#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub value: String,
}

/// Create chat request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateChatRequest {
    #[validate(length(max = 200, message = "Name must be at most 200 characters"))]
    pub name: Option<String>,

    #[validate(length(min = 1, message = "At least one member is required"))]
    pub member_ids: Vec<Uuid>,

    #[serde(default)]
    pub is_private: bool,
}

/// Rename chat request
#[derive(Debug, Deserialize, Validate)]
pub struct RenameChatRequest {
    #[validate(length(max = 200, message = "Name must be at most 200 characters"))]
    pub name: String,
}

/// Change owner request
#[derive(Debug, Deserialize)]
pub struct ChangeOwnerRequest {
    pub owner_id: Uuid,
}

/// Add/remove members request
#[derive(Debug, Deserialize, Validate)]
pub struct MembersRequest {
    #[validate(length(min = 1, message = "At least one user id is required"))]
    pub user_ids: Vec<Uuid>,
}

/// Send message request
#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(length(max = 3000, message = "Text must be at most 3000 characters"))]
    pub text: String,
}

/// Message history query parameters
#[derive(Debug, Deserialize)]
pub struct MessageQueryParams {
    /// Pivot timestamp; defaults to now
    pub skip: Option<DateTime<Utc>>,
    pub take: Option<i64>,
    #[serde(default)]
    pub direction: PageDirection,
}

/// Around-unread query parameters
#[derive(Debug, Deserialize)]
pub struct AroundUnreadQueryParams {
    pub take: Option<i64>,
}

/// Mark read request
#[derive(Debug, Default, Deserialize)]
pub struct MarkReadRequest {
    /// Defaults to now
    pub up_to: Option<DateTime<Utc>>,
}
