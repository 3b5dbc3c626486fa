//! Message Repository Implementation
//!
//! PostgreSQL implementation of the MessageRepository trait.
//! Unread counts are computed from member watermarks; nothing is stored per message.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    AuthoredMessage, MemberUnread, Message, MessageRepository, NewMessage, PageDirection,
};
use crate::infrastructure::database::PgSession;
use crate::shared::error::AppError;

/// Database row of a message joined with its author's name.
#[derive(Debug, sqlx::FromRow)]
struct AuthoredMessageRow {
    id: Uuid,
    created_at: DateTime<Utc>,
    text: String,
    author_id: Uuid,
    chat_id: Uuid,
    author_name: String,
}

impl From<AuthoredMessageRow> for AuthoredMessage {
    fn from(row: AuthoredMessageRow) -> Self {
        AuthoredMessage {
            message: Message {
                id: row.id,
                created_at: row.created_at,
                text: row.text,
                author_id: row.author_id,
                chat_id: row.chat_id,
            },
            author_name: row.author_name,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MemberUnreadRow {
    user_id: Uuid,
    last_read_at: DateTime<Utc>,
    unread: i64,
}

const OLDER_EXCLUSIVE: &str = r#"
    SELECT m.id, m.created_at, m.text, m.author_id, m.chat_id, u.name AS author_name
    FROM messages m
    INNER JOIN users u ON u.id = m.author_id
    WHERE m.chat_id = $1 AND m.created_at < $2
    ORDER BY m.created_at DESC
    LIMIT $3
"#;

const OLDER_INCLUSIVE: &str = r#"
    SELECT m.id, m.created_at, m.text, m.author_id, m.chat_id, u.name AS author_name
    FROM messages m
    INNER JOIN users u ON u.id = m.author_id
    WHERE m.chat_id = $1 AND m.created_at <= $2
    ORDER BY m.created_at DESC
    LIMIT $3
"#;

// The page closest to the pivot, presented newest first like the other direction
const NEWER: &str = r#"
    SELECT * FROM (
        SELECT m.id, m.created_at, m.text, m.author_id, m.chat_id, u.name AS author_name
        FROM messages m
        INNER JOIN users u ON u.id = m.author_id
        WHERE m.chat_id = $1 AND m.created_at > $2
        ORDER BY m.created_at ASC
        LIMIT $3
    ) page
    ORDER BY page.created_at DESC
"#;

#[async_trait]
impl MessageRepository for PgSession {
    async fn insert_message(&mut self, message: NewMessage) -> Result<Message, AppError> {
        let (id, created_at): (Uuid, DateTime<Utc>) = sqlx::query_as(
            r#"
            INSERT INTO messages (id, text, author_id, chat_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&message.text)
        .bind(message.author_id)
        .bind(message.chat_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(Message {
            id,
            created_at,
            text: message.text,
            author_id: message.author_id,
            chat_id: message.chat_id,
        })
    }

    async fn find_last_messages(&mut self, chat_ids: &[Uuid]) -> Result<Vec<AuthoredMessage>, AppError> {
        if chat_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, AuthoredMessageRow>(
            r#"
            SELECT DISTINCT ON (m.chat_id)
                   m.id, m.created_at, m.text, m.author_id, m.chat_id, u.name AS author_name
            FROM messages m
            INNER JOIN users u ON u.id = m.author_id
            WHERE m.chat_id = ANY($1)
            ORDER BY m.chat_id, m.created_at DESC
            "#,
        )
        .bind(chat_ids)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows.into_iter().map(AuthoredMessage::from).collect())
    }

    async fn count_unread_for_user(
        &mut self,
        user_id: Uuid,
        chat_ids: &[Uuid],
    ) -> Result<Vec<(Uuid, i64)>, AppError> {
        if chat_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, (Uuid, i64)>(
            r#"
            SELECT mb.chat_id, COUNT(*) AS unread
            FROM members mb
            INNER JOIN messages m
                ON m.chat_id = mb.chat_id
               AND m.created_at > mb.last_read_at
               AND m.author_id <> mb.user_id
            WHERE mb.user_id = $1 AND mb.chat_id = ANY($2)
            GROUP BY mb.chat_id
            "#,
        )
        .bind(user_id)
        .bind(chat_ids)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows)
    }

    async fn count_unread_by_member(&mut self, chat_id: Uuid) -> Result<Vec<MemberUnread>, AppError> {
        let rows = sqlx::query_as::<_, MemberUnreadRow>(
            r#"
            SELECT mb.user_id, mb.last_read_at, COUNT(m.id) AS unread
            FROM members mb
            LEFT JOIN messages m
                ON m.chat_id = mb.chat_id
               AND m.created_at > mb.last_read_at
               AND m.author_id <> mb.user_id
            WHERE mb.chat_id = $1
            GROUP BY mb.user_id, mb.last_read_at
            "#,
        )
        .bind(chat_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| MemberUnread {
                user_id: r.user_id,
                last_read_at: r.last_read_at,
                unread: r.unread,
            })
            .collect())
    }

    async fn find_messages(
        &mut self,
        chat_id: Uuid,
        pivot: DateTime<Utc>,
        direction: PageDirection,
        inclusive: bool,
        limit: i64,
    ) -> Result<Vec<AuthoredMessage>, AppError> {
        if limit <= 0 {
            return Ok(Vec::new());
        }

        let sql = match (direction, inclusive) {
            (PageDirection::Older, false) => OLDER_EXCLUSIVE,
            (PageDirection::Older, true) => OLDER_INCLUSIVE,
            (PageDirection::Newer, _) => NEWER,
        };

        let rows = sqlx::query_as::<_, AuthoredMessageRow>(sql)
            .bind(chat_id)
            .bind(pivot)
            .bind(limit)
            .fetch_all(&mut *self.tx)
            .await?;

        Ok(rows.into_iter().map(AuthoredMessage::from).collect())
    }
}
