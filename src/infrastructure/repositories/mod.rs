//! Repository Implementations
//!
//! PostgreSQL implementations of the domain repository traits.
//!
//! Every repository trait is implemented directly on [`PgSession`], so all
//! queries of one service operation run on the same transaction.
//!
//! ## Available Repositories
//!
//! - **UserRepository** - User directory with case-insensitive uniqueness
//! - **ChatRepository** - Chats and ownership
//! - **MemberRepository** - Membership and read watermarks
//! - **MessageRepository** - Messages, unread counts and history paging
//!
//! [`PgSession`]: crate::infrastructure::database::PgSession

mod chat_repository;
mod member_repository;
mod message_repository;
mod user_repository;

use crate::shared::error::AppError;

/// Map a unique-index violation to a Conflict, anything else to a database error.
pub(crate) fn conflict_on_unique(err: sqlx::Error, message: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Conflict(message.to_string()),
        _ => AppError::Database(err),
    }
}

/// Map a foreign-key violation to a Conflict, anything else to a database error.
pub(crate) fn conflict_on_reference(err: sqlx::Error, message: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            AppError::Conflict(message.to_string())
        }
        _ => AppError::Database(err),
    }
}
