//! User entity and repository trait.
//!
//! Maps to the `users` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::AppError;

/// Represents a user account in the chat system.
///
/// Maps to the `users` table:
/// - id: UUID PRIMARY KEY
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp()
/// - name: VARCHAR(200) NOT NULL, unique on lower(name)
/// - login: VARCHAR(200) NOT NULL, unique on lower(login)
/// - secret_key_hash: TEXT NOT NULL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Primary key
    pub id: Uuid,

    /// Account creation timestamp
    pub created_at: DateTime<Utc>,

    /// Display name (unique, case-insensitive)
    pub name: String,

    /// Login (unique, case-insensitive)
    pub login: String,

    /// Argon2 hash of the secret key used for identity binding
    #[serde(skip_serializing)]
    pub secret_key_hash: String,
}

/// Fields required to insert a user. Id and timestamp are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub login: String,
    pub secret_key_hash: String,
}

/// Repository trait for User data access operations.
///
/// Implemented by the unit-of-work session, so every call runs inside the
/// transaction of the operation that opened it.
#[async_trait]
pub trait UserRepository: Send {
    /// Find a user by id.
    async fn find_user(&mut self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Find a user by login, compared trimmed and case-insensitively.
    async fn find_user_by_login(&mut self, login: &str) -> Result<Option<User>, AppError>;

    /// Find every existing user among `ids`. Unknown ids are skipped.
    async fn find_users(&mut self, ids: &[Uuid]) -> Result<Vec<User>, AppError>;

    /// List users whose name contains `search` (case-insensitive), or all users.
    async fn search_users(&mut self, search: Option<&str>) -> Result<Vec<User>, AppError>;

    /// Whether another user (other than `except`) already has this name.
    async fn is_name_used(&mut self, name: &str, except: Option<Uuid>) -> Result<bool, AppError>;

    /// Whether another user (other than `except`) already has this login.
    async fn is_login_used(&mut self, login: &str, except: Option<Uuid>) -> Result<bool, AppError>;

    /// Insert a new user.
    async fn insert_user(&mut self, user: NewUser) -> Result<User, AppError>;

    /// Persist name, login and secret key hash of an existing user.
    async fn update_user(&mut self, user: &User) -> Result<(), AppError>;

    /// Delete a user. Memberships and authored messages cascade.
    async fn delete_user(&mut self, id: Uuid) -> Result<(), AppError>;
}
