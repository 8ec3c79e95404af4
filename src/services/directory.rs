use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::db::repository;
use crate::error::AppError;
use crate::models::UserSummary;

/// Read-only collaborator for user display fields. Kept behind a trait
/// so the lookup can be swapped for an external identity service without
/// touching the enrollment engine.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user(&self, id: &str) -> Result<Option<UserSummary>, AppError>;
}

pub struct DbUserDirectory {
    db: SqlitePool,
}

impl DbUserDirectory {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserDirectory for DbUserDirectory {
    async fn find_user(&self, id: &str) -> Result<Option<UserSummary>, AppError> {
        repository::find_user_summary(&self.db, id).await
    }
}

pub struct NoopUserDirectory;

#[async_trait]
impl UserDirectory for NoopUserDirectory {
    async fn find_user(&self, _id: &str) -> Result<Option<UserSummary>, AppError> {
        Ok(None)
    }
}
