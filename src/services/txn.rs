//! Transactional execution with retry-on-conflict semantics. A unit of
//! work receives the transaction's connection, runs every read and write
//! against it, and either commits as a whole or leaves nothing behind.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, warn};

use crate::error::AppError;

/// Boxed future returned by a transactional unit of work; borrows the
/// transaction's connection for its whole lifetime.
pub type UnitFuture<'c, T> = Pin<Box<dyn Future<Output = Result<T, AppError>> + Send + 'c>>;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempt budget, including the first try.
    pub max_attempts: u32,
    /// First backoff interval; doubles on each further attempt.
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(20),
        }
    }
}

/// Runs units of work atomically against the pool. Stateless across
/// calls; every invocation begins a fresh transaction.
#[derive(Clone)]
pub struct TxnExecutor {
    db: SqlitePool,
    policy: RetryPolicy,
}

impl TxnExecutor {
    pub fn new(db: SqlitePool, policy: RetryPolicy) -> Self {
        Self { db, policy }
    }

    /// Executes `unit` inside a single transaction. Commits on success,
    /// rolls back on any error, and returns the connection to the pool
    /// either way.
    pub async fn run_atomic<T, F>(&self, unit: &mut F) -> Result<T, AppError>
    where
        F: for<'c> FnMut(&'c mut SqliteConnection) -> UnitFuture<'c, T> + Send,
    {
        let mut tx = self.db.begin().await.map_err(AppError::from_storage)?;
        let result = unit(&mut *tx).await;
        match result {
            Ok(value) => {
                tx.commit().await.map_err(AppError::from_storage)?;
                Ok(value)
            }
            Err(err) => {
                if let Err(abort) = tx.rollback().await {
                    warn!("transaction rollback failed: {}", abort);
                }
                Err(err)
            }
        }
    }

    /// Repeatedly runs `unit` atomically until it succeeds, fails with a
    /// deterministic error, or the attempt budget is exhausted. Only
    /// transient conflicts are retried; domain errors propagate on the
    /// first attempt. Between attempts the backoff doubles
    /// (`base * 2^(attempt - 1)`). An exhausted budget surfaces as a
    /// `Conflict` so callers never see the internal transient shape.
    pub async fn run_with_retry<T, F>(&self, mut unit: F) -> Result<T, AppError>
    where
        F: for<'c> FnMut(&'c mut SqliteConnection) -> UnitFuture<'c, T> + Send,
    {
        let mut attempt = 1u32;
        loop {
            match self.run_atomic(&mut unit).await {
                Err(err) if err.is_transient() && attempt < self.policy.max_attempts => {
                    let backoff = self.policy.base_backoff * 2u32.saturating_pow(attempt - 1);
                    debug!(attempt, ?backoff, %err, "transient conflict, retrying unit of work");
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(err) if err.is_transient() => {
                    warn!(attempt, %err, "retry budget exhausted");
                    return Err(AppError::Conflict(
                        "storage conflict persisted after retries, try again".to_string(),
                    ));
                }
                other => return other,
            }
        }
    }
}
