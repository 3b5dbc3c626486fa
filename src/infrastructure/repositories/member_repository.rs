//! Member Repository Implementation
//!
//! PostgreSQL implementation of the MemberRepository trait.
//! Handles chat membership and read watermarks.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::user_repository::UserRow;
use crate::domain::{Member, MemberRepository, User};
use crate::infrastructure::database::PgSession;
use crate::shared::error::AppError;

/// Database row representation matching the members table schema.
#[derive(Debug, sqlx::FromRow)]
struct MemberRow {
    id: Uuid,
    chat_id: Uuid,
    user_id: Uuid,
    last_read_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl From<MemberRow> for Member {
    fn from(row: MemberRow) -> Self {
        Member {
            id: row.id,
            chat_id: row.chat_id,
            user_id: row.user_id,
            last_read_at: row.last_read_at,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl MemberRepository for PgSession {
    async fn find_member(&mut self, chat_id: Uuid, user_id: Uuid) -> Result<Option<Member>, AppError> {
        let row = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT id, chat_id, user_id, last_read_at, created_at
            FROM members
            WHERE chat_id = $1 AND user_id = $2
            "#,
        )
        .bind(chat_id)
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(Member::from))
    }

    async fn find_members(&mut self, chat_id: Uuid) -> Result<Vec<Member>, AppError> {
        let rows = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT id, chat_id, user_id, last_read_at, created_at
            FROM members
            WHERE chat_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(chat_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows.into_iter().map(Member::from).collect())
    }

    async fn find_member_users(&mut self, chat_id: Uuid) -> Result<Vec<User>, AppError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT u.id, u.created_at, u.name, u.login, u.secret_key_hash
            FROM users u
            INNER JOIN members m ON m.user_id = u.id
            WHERE m.chat_id = $1
            ORDER BY m.created_at
            "#,
        )
        .bind(chat_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows.into_iter().map(UserRow::into_user).collect())
    }

    async fn find_counterpart_names(
        &mut self,
        user_id: Uuid,
        chat_ids: &[Uuid],
    ) -> Result<Vec<(Uuid, String)>, AppError> {
        let rows = sqlx::query_as::<_, (Uuid, String)>(
            r#"
            SELECT DISTINCT ON (m.chat_id) m.chat_id, u.name
            FROM members m
            INNER JOIN users u ON u.id = m.user_id
            WHERE m.chat_id = ANY($1) AND m.user_id <> $2
            ORDER BY m.chat_id, m.created_at
            "#,
        )
        .bind(chat_ids)
        .bind(user_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows)
    }

    async fn insert_member(&mut self, chat_id: Uuid, user_id: Uuid) -> Result<Option<Member>, AppError> {
        // The watermark starts at join time
        let row = sqlx::query_as::<_, MemberRow>(
            r#"
            INSERT INTO members (id, chat_id, user_id, created_at, last_read_at)
            VALUES ($1, $2, $3, clock_timestamp(), clock_timestamp())
            ON CONFLICT (chat_id, user_id) DO NOTHING
            RETURNING id, chat_id, user_id, last_read_at, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(chat_id)
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(Member::from))
    }

    async fn delete_member(&mut self, chat_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM members WHERE chat_id = $1 AND user_id = $2")
            .bind(chat_id)
            .bind(user_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_last_read(
        &mut self,
        chat_id: Uuid,
        user_id: Uuid,
        last_read_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE members
            SET last_read_at = $3
            WHERE chat_id = $1 AND user_id = $2
            "#,
        )
        .bind(chat_id)
        .bind(user_id)
        .bind(last_read_at)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "User {} is not a member of chat {}",
                user_id, chat_id
            )));
        }

        Ok(())
    }
}
