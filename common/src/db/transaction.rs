//! Transaction handling for database operations
//!
//! This module provides a standardized approach to database transactions.
//! Ledger writes run inside one `PgTransaction` per attempt, with a bounded
//! lock wait so that a contended account surfaces as a conflict instead of
//! blocking indefinitely.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, Transaction as SqlxTransaction};

use crate::error::{Error, Result};

/// A PostgreSQL transaction
pub struct PgTransaction {
    tx: SqlxTransaction<'static, Postgres>,
}

impl PgTransaction {
    /// Create a new PgTransaction
    pub fn new(tx: SqlxTransaction<'static, Postgres>) -> Self {
        Self { tx }
    }

    /// Connection to run queries on inside this transaction
    pub fn conn(&mut self) -> &mut PgConnection {
        &mut *self.tx
    }

    /// Bound how long row locks may be waited for inside this transaction
    pub async fn set_lock_timeout(&mut self, timeout: Duration) -> Result<()> {
        // SET does not accept bind parameters
        let statement = format!("SET LOCAL lock_timeout = '{}ms'", timeout.as_millis());
        sqlx::query(&statement)
            .execute(&mut *self.tx)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }

    /// Commit the transaction
    pub async fn commit(self) -> Result<()> {
        self.tx.commit().await.map_err(Error::Database)
    }

    /// Rollback the transaction
    pub async fn rollback(self) -> Result<()> {
        self.tx.rollback().await.map_err(Error::Database)
    }
}

/// Transaction manager trait for creating and managing transactions
#[async_trait]
pub trait TransactionManager: Send + Sync {
    /// Begin a new transaction
    async fn begin_transaction(&self) -> Result<PgTransaction>;
}

/// A PostgreSQL transaction manager implementation
#[derive(Clone)]
pub struct PgTransactionManager {
    pool: PgPool,
}

impl PgTransactionManager {
    /// Create a new PgTransactionManager
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionManager for PgTransactionManager {
    async fn begin_transaction(&self) -> Result<PgTransaction> {
        let tx = self.pool.begin().await.map_err(Error::Database)?;
        Ok(PgTransaction::new(tx))
    }
}

/// Whether a database error means "lost a race, try again"
///
/// Covers serialization failures, deadlocks, lock timeouts and pool
/// exhaustion.
pub fn is_conflict(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::PoolTimedOut => true,
        sqlx::Error::Database(db) => matches!(
            db.code().as_deref(),
            Some("40001") | Some("40P01") | Some("55P03")
        ),
        _ => false,
    }
}

/// Whether a database error is a unique-constraint violation
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some("23505"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_timeouts_count_as_conflicts() {
        assert!(is_conflict(&sqlx::Error::PoolTimedOut));
        assert!(!is_conflict(&sqlx::Error::RowNotFound));
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }
}
