use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// SQLite result codes that indicate two transactions raced on the same
/// data. Retrying the whole unit of work is the correct response.
const RETRYABLE_SQLITE_CODES: &[&str] = &[
    "5",   // SQLITE_BUSY
    "6",   // SQLITE_LOCKED
    "261", // SQLITE_BUSY_RECOVERY
    "262", // SQLITE_LOCKED_SHAREDCACHE
    "517", // SQLITE_BUSY_SNAPSHOT
    "773", // SQLITE_BUSY_TIMEOUT
];

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("not authorized to perform this action")]
    Unauthorized,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("student is already enrolled in this course")]
    AlreadyEnrolled,

    #[error("course has reached its enrollment capacity")]
    CourseFull,

    #[error("course is not open for enrollment")]
    CourseUnavailable,

    #[error("enrollment is already withdrawn")]
    AlreadyWithdrawn,

    #[error("completed enrollments cannot be withdrawn")]
    CannotWithdrawCompleted,

    #[error("enrollment is closed and can no longer be updated")]
    EnrollmentClosed,

    #[error("course still has active enrollments")]
    CourseHasActiveEnrollments,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("transient storage conflict: {0}")]
    Transient(String),

    #[error("storage error: {0}")]
    Storage(#[source] sqlx::Error),
}

impl AppError {
    /// Classifies a raw driver error at the point it is raised. Retryable
    /// lock contention becomes `Transient`, constraint violations become
    /// deterministic conflicts, and everything else stays fatal. There is
    /// deliberately no `From<sqlx::Error>` impl, so no storage error can
    /// enter the taxonomy unclassified.
    pub fn from_storage(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if let Some(code) = db.code() {
                if RETRYABLE_SQLITE_CODES.contains(&code.as_ref()) {
                    return AppError::Transient(db.message().to_string());
                }
            }
            if db.is_unique_violation() {
                return AppError::Conflict(db.message().to_string());
            }
            if db.is_foreign_key_violation() {
                return AppError::Validation("referenced record does not exist".to_string());
            }
        }
        AppError::Storage(err)
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::Transient(_))
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::Unauthorized => (StatusCode::FORBIDDEN, self.to_string()),
            AppError::Validation(_) | AppError::CourseUnavailable => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            AppError::AlreadyEnrolled
            | AppError::CourseFull
            | AppError::AlreadyWithdrawn
            | AppError::CannotWithdrawCompleted
            | AppError::EnrollmentClosed
            | AppError::CourseHasActiveEnrollments
            | AppError::Conflict(_)
            | AppError::Transient(_) => (StatusCode::CONFLICT, self.to_string()),
            AppError::Storage(e) => {
                error!("storage error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Storage error occurred".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: status.to_string(),
            message: error_message,
        });

        (status, body).into_response()
    }
}
