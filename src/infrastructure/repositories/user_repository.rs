//! User Repository Implementation
//!
//! PostgreSQL implementation of the UserRepository trait.
//! Maps between the database schema and domain User entity.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{conflict_on_reference, conflict_on_unique};
use crate::domain::{NewUser, User, UserRepository};
use crate::infrastructure::database::PgSession;
use crate::shared::error::AppError;

/// Database row representation matching the users table schema.
#[derive(Debug, sqlx::FromRow)]
pub(super) struct UserRow {
    id: Uuid,
    created_at: DateTime<Utc>,
    name: String,
    login: String,
    secret_key_hash: String,
}

impl UserRow {
    /// Convert database row to domain User entity.
    pub(super) fn into_user(self) -> User {
        User {
            id: self.id,
            created_at: self.created_at,
            name: self.name,
            login: self.login,
            secret_key_hash: self.secret_key_hash,
        }
    }
}

#[async_trait]
impl UserRepository for PgSession {
    async fn find_user(&mut self, id: Uuid) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, created_at, name, login, secret_key_hash
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(UserRow::into_user))
    }

    async fn find_user_by_login(&mut self, login: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, created_at, name, login, secret_key_hash
            FROM users
            WHERE lower(login) = lower($1)
            "#,
        )
        .bind(login.trim())
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(UserRow::into_user))
    }

    async fn find_users(&mut self, ids: &[Uuid]) -> Result<Vec<User>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, created_at, name, login, secret_key_hash
            FROM users
            WHERE id = ANY($1)
            ORDER BY created_at
            "#,
        )
        .bind(ids)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows.into_iter().map(UserRow::into_user).collect())
    }

    async fn search_users(&mut self, search: Option<&str>) -> Result<Vec<User>, AppError> {
        // strpos keeps the search literal; LIKE would treat % and _ as wildcards
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, created_at, name, login, secret_key_hash
            FROM users
            WHERE $1::text IS NULL OR strpos(lower(name), lower($1)) > 0
            ORDER BY name
            "#,
        )
        .bind(search)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows.into_iter().map(UserRow::into_user).collect())
    }

    async fn is_name_used(&mut self, name: &str, except: Option<Uuid>) -> Result<bool, AppError> {
        let used = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM users
                WHERE lower(name) = lower($1) AND ($2::uuid IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(name.trim())
        .bind(except)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(used)
    }

    async fn is_login_used(&mut self, login: &str, except: Option<Uuid>) -> Result<bool, AppError> {
        let used = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM users
                WHERE lower(login) = lower($1) AND ($2::uuid IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(login.trim())
        .bind(except)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(used)
    }

    async fn insert_user(&mut self, user: NewUser) -> Result<User, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, name, login, secret_key_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, created_at, name, login, secret_key_hash
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&user.name)
        .bind(&user.login)
        .bind(&user.secret_key_hash)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| conflict_on_unique(e, "Name or login is already used"))?;

        Ok(row.into_user())
    }

    async fn update_user(&mut self, user: &User) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = $2, login = $3, secret_key_hash = $4
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.login)
        .bind(&user.secret_key_hash)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| conflict_on_unique(e, "Name or login is already used"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", user.id)));
        }

        Ok(())
    }

    async fn delete_user(&mut self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| conflict_on_reference(e, "User still owns chats"))?;

        Ok(())
    }
}
