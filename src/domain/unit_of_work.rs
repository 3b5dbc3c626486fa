//! Unit of Work contracts
//!
//! Every service operation opens one session from a [`SessionFactory`], runs
//! all of its reads and writes through it and commits once at the end.
//! A session dropped without [`UnitOfWork::commit`] is rolled back, which
//! covers business errors, unexpected failures and cancellation (dropping
//! the operation's future) alike.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::entities::{ChatRepository, MemberRepository, MessageRepository, UserRepository};
use crate::shared::error::AppError;

/// A transactional session exposing all repositories.
#[async_trait]
pub trait UnitOfWork:
    UserRepository + ChatRepository + MemberRepository + MessageRepository + Send
{
    /// Current time on the store's clock, the same clock that stamps inserted rows.
    async fn now(&mut self) -> Result<DateTime<Utc>, AppError>;

    /// Commit everything done through this session.
    async fn commit(self) -> Result<(), AppError>;
}

/// Opens units of work against a store.
#[async_trait]
pub trait SessionFactory: Send + Sync + 'static {
    type Session: UnitOfWork + 'static;

    /// Begin a new session.
    async fn begin(&self) -> Result<Self::Session, AppError>;

    /// Check that the store is reachable.
    async fn ping(&self) -> Result<(), AppError>;
}
