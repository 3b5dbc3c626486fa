//! Unit of Work Pattern Implementation
//!
//! Provides transactional boundaries for database operations.
//! Ensures all operations within a business transaction succeed or fail together.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::{SessionFactory, UnitOfWork};
use crate::shared::error::AppError;

/// Opens PostgreSQL transactions.
#[derive(Clone)]
pub struct PgSessionFactory {
    pool: PgPool,
}

impl PgSessionFactory {
    /// Create from a PgPool directly.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// One PostgreSQL transaction. Rolled back when dropped without commit.
pub struct PgSession {
    pub(crate) tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl SessionFactory for PgSessionFactory {
    type Session = PgSession;

    async fn begin(&self) -> Result<PgSession, AppError> {
        let tx = self.pool.begin().await.map_err(AppError::Database)?;
        Ok(PgSession { tx })
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for PgSession {
    async fn now(&mut self) -> Result<DateTime<Utc>, AppError> {
        // clock_timestamp() is what column defaults use; now() is frozen at BEGIN
        let (now,): (DateTime<Utc>,) = sqlx::query_as("SELECT clock_timestamp()")
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(now)
    }

    async fn commit(self) -> Result<(), AppError> {
        self.tx.commit().await.map_err(AppError::Database)
    }
}
