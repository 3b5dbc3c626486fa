//! Chat Repository Implementation
//!
//! PostgreSQL implementation of the ChatRepository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Chat, ChatRepository, NewChat};
use crate::infrastructure::database::PgSession;
use crate::shared::error::AppError;

/// Database row representation matching the chats table schema.
#[derive(Debug, sqlx::FromRow)]
struct ChatRow {
    id: Uuid,
    created_at: DateTime<Utc>,
    is_private: bool,
    name: Option<String>,
    owner_id: Uuid,
}

impl From<ChatRow> for Chat {
    fn from(row: ChatRow) -> Self {
        Chat {
            id: row.id,
            created_at: row.created_at,
            is_private: row.is_private,
            name: row.name,
            owner_id: row.owner_id,
        }
    }
}

#[async_trait]
impl ChatRepository for PgSession {
    async fn find_chat(&mut self, id: Uuid) -> Result<Option<Chat>, AppError> {
        let row = sqlx::query_as::<_, ChatRow>(
            r#"
            SELECT id, created_at, is_private, name, owner_id
            FROM chats
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(Chat::from))
    }

    async fn find_chats_for_user(&mut self, user_id: Uuid) -> Result<Vec<Chat>, AppError> {
        let rows = sqlx::query_as::<_, ChatRow>(
            r#"
            SELECT c.id, c.created_at, c.is_private, c.name, c.owner_id
            FROM chats c
            INNER JOIN members m ON m.chat_id = c.id
            WHERE m.user_id = $1
            ORDER BY c.created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows.into_iter().map(Chat::from).collect())
    }

    async fn count_chats_owned_by(&mut self, user_id: Uuid) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM chats WHERE owner_id = $1")
            .bind(user_id)
            .fetch_one(&mut *self.tx)
            .await?;

        Ok(count)
    }

    async fn insert_chat(&mut self, chat: NewChat) -> Result<Chat, AppError> {
        let row = sqlx::query_as::<_, ChatRow>(
            r#"
            INSERT INTO chats (id, is_private, name, owner_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, created_at, is_private, name, owner_id
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(chat.is_private)
        .bind(&chat.name)
        .bind(chat.owner_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(row.into())
    }

    async fn update_chat(&mut self, chat: &Chat) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE chats
            SET name = $2, owner_id = $3
            WHERE id = $1
            "#,
        )
        .bind(chat.id)
        .bind(&chat.name)
        .bind(chat.owner_id)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Chat {} not found", chat.id)));
        }

        Ok(())
    }

    async fn delete_chat(&mut self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM chats WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }
}
