//! User Service
//!
//! The user directory: registration, lookup, profile updates and removal.
//! Names and logins are unique after trimming and case folding.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::application::dto::UserView;
use crate::domain::{ChatRepository, NewUser, SessionFactory, UnitOfWork, User, UserRepository};
use crate::shared::error::AppError;
use crate::shared::secret::SecretHasher;
use crate::shared::validation::{has_value, require_text, unique_ids, MAX_NAME_LENGTH};

/// User service trait
#[async_trait]
pub trait UserService: Send + Sync {
    /// Register a new user
    async fn create_user(&self, request: CreateUserDto) -> Result<UserView, AppError>;

    /// Update the given fields of a user
    async fn update_user(&self, user_id: Uuid, update: UpdateUserDto) -> Result<(), AppError>;

    /// Get user by ID
    async fn get_user(&self, user_id: Uuid) -> Result<UserView, AppError>;

    /// Resolve an identity from login and secret key
    async fn get_user_by_credentials(&self, login: &str, secret_key: &str) -> Result<UserView, AppError>;

    /// List users, optionally filtered by a name substring
    async fn list_users(&self, search: Option<&str>) -> Result<Vec<UserView>, AppError>;

    /// Remove users that own no chats
    async fn remove_users(&self, ids: &[Uuid]) -> Result<(), AppError>;

    /// Whether a name is already taken
    async fn is_name_used(&self, name: &str) -> Result<bool, AppError>;

    /// Whether a login is already taken
    async fn is_login_used(&self, login: &str) -> Result<bool, AppError>;
}

/// Create user request
#[derive(Debug, Clone)]
pub struct CreateUserDto {
    pub name: String,
    pub login: String,
    pub secret_key: String,
}

/// Update user request; blank fields are left unchanged
#[derive(Debug, Clone, Default)]
pub struct UpdateUserDto {
    pub name: Option<String>,
    pub login: Option<String>,
    pub secret_key: Option<String>,
}

/// Generic answer for a failed identity lookup.
const BAD_CREDENTIALS: &str = "Login or key is incorrect";

/// UserService implementation
pub struct UserServiceImpl<S>
where
    S: SessionFactory,
{
    store: Arc<S>,
    hasher: SecretHasher,
}

impl<S> UserServiceImpl<S>
where
    S: SessionFactory,
{
    pub fn new(store: Arc<S>, hasher: SecretHasher) -> Self {
        Self { store, hasher }
    }

    async fn ensure_name_free(
        tx: &mut S::Session,
        name: &str,
        except: Option<Uuid>,
    ) -> Result<(), AppError> {
        if tx.is_name_used(name, except).await? {
            return Err(AppError::Conflict(format!("Name '{}' is already used", name)));
        }
        Ok(())
    }

    async fn ensure_login_free(
        tx: &mut S::Session,
        login: &str,
        except: Option<Uuid>,
    ) -> Result<(), AppError> {
        if tx.is_login_used(login, except).await? {
            return Err(AppError::Conflict(format!("Login '{}' is already used", login)));
        }
        Ok(())
    }
}

#[async_trait]
impl<S> UserService for UserServiceImpl<S>
where
    S: SessionFactory,
{
    async fn create_user(&self, request: CreateUserDto) -> Result<UserView, AppError> {
        let name = require_text("Name", &request.name, MAX_NAME_LENGTH)?;
        let login = require_text("Login", &request.login, MAX_NAME_LENGTH)?;
        if request.secret_key.trim().is_empty() {
            return Err(AppError::Validation("Secret key can't be empty".into()));
        }

        let mut tx = self.store.begin().await?;
        Self::ensure_name_free(&mut tx, name, None).await?;
        Self::ensure_login_free(&mut tx, login, None).await?;

        let user = tx
            .insert_user(NewUser {
                name: name.to_string(),
                login: login.to_string(),
                secret_key_hash: self.hasher.hash(&request.secret_key)?,
            })
            .await?;
        tx.commit().await?;

        tracing::info!(user_id = %user.id, "User created");
        Ok(UserView::with_login(user))
    }

    async fn update_user(&self, user_id: Uuid, update: UpdateUserDto) -> Result<(), AppError> {
        let mut tx = self.store.begin().await?;
        let mut user = tx
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        if has_value(update.name.as_deref()) {
            let name = require_text("Name", update.name.as_deref().unwrap_or_default(), MAX_NAME_LENGTH)?;
            Self::ensure_name_free(&mut tx, name, Some(user_id)).await?;
            user.name = name.to_string();
        }

        if has_value(update.login.as_deref()) {
            let login = require_text("Login", update.login.as_deref().unwrap_or_default(), MAX_NAME_LENGTH)?;
            Self::ensure_login_free(&mut tx, login, Some(user_id)).await?;
            user.login = login.to_string();
        }

        if let Some(secret_key) = update.secret_key.as_deref().filter(|k| !k.trim().is_empty()) {
            user.secret_key_hash = self.hasher.hash(secret_key)?;
        }

        tx.update_user(&user).await?;
        tx.commit().await?;

        tracing::info!(user_id = %user_id, "User updated");
        Ok(())
    }

    async fn get_user(&self, user_id: Uuid) -> Result<UserView, AppError> {
        let mut tx = self.store.begin().await?;
        let user = tx
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        Ok(UserView::public(user))
    }

    async fn get_user_by_credentials(&self, login: &str, secret_key: &str) -> Result<UserView, AppError> {
        if login.trim().is_empty() || secret_key.is_empty() {
            return Err(AppError::NotFound(BAD_CREDENTIALS.into()));
        }

        let mut tx = self.store.begin().await?;
        let user: User = tx
            .find_user_by_login(login)
            .await?
            .ok_or_else(|| AppError::NotFound(BAD_CREDENTIALS.into()))?;

        if !self.hasher.verify(secret_key, &user.secret_key_hash)? {
            tracing::debug!(user_id = %user.id, "Secret key mismatch");
            return Err(AppError::NotFound(BAD_CREDENTIALS.into()));
        }

        Ok(UserView::with_login(user))
    }

    async fn list_users(&self, search: Option<&str>) -> Result<Vec<UserView>, AppError> {
        let search = search.map(str::trim).filter(|s| !s.is_empty());

        let mut tx = self.store.begin().await?;
        let users = tx.search_users(search).await?;

        Ok(users.into_iter().map(UserView::public).collect())
    }

    async fn remove_users(&self, ids: &[Uuid]) -> Result<(), AppError> {
        if ids.is_empty() {
            return Err(AppError::Validation("At least one user id is required".into()));
        }

        let ids = unique_ids(ids);
        let mut tx = self.store.begin().await?;
        for &id in &ids {
            if tx.find_user(id).await?.is_none() {
                return Err(AppError::NotFound(format!("User {} not found", id)));
            }
            if tx.count_chats_owned_by(id).await? > 0 {
                return Err(AppError::Conflict(format!(
                    "User {} owns chats; remove them or transfer ownership first",
                    id
                )));
            }
            tx.delete_user(id).await?;
        }
        tx.commit().await?;

        tracing::info!(count = ids.len(), "Users removed");
        Ok(())
    }

    async fn is_name_used(&self, name: &str) -> Result<bool, AppError> {
        let mut tx = self.store.begin().await?;
        tx.is_name_used(name, None).await
    }

    async fn is_login_used(&self, login: &str) -> Result<bool, AppError> {
        let mut tx = self.store.begin().await?;
        tx.is_login_used(login, None).await
    }
}
