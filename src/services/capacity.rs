//! Course availability checks. Must run against the same transaction
//! that performs the subsequent enrollment write, so the snapshot the
//! check sees and the write it guards are serialized as one atomic unit.

use sqlx::SqliteConnection;

use crate::db::repository;
use crate::error::AppError;
use crate::models::Course;

/// Rejects enrollment into unpublished or full courses. `course` must
/// have been loaded inside the active transaction that `conn` belongs to.
pub async fn ensure_enrollable(
    conn: &mut SqliteConnection,
    course: &Course,
) -> Result<(), AppError> {
    if !course.is_published {
        return Err(AppError::CourseUnavailable);
    }

    if let Some(max_students) = course.max_students {
        // Count live rows instead of trusting the denormalized counter.
        let seated = repository::count_seated_enrollments(&mut *conn, &course.id).await?;
        if seated >= max_students {
            return Err(AppError::CourseFull);
        }
    }

    Ok(())
}
