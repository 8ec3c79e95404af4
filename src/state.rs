use sqlx::SqlitePool;

use crate::services::EnrollmentService;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub enrollments: EnrollmentService,
}
