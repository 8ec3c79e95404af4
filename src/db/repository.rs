//! Data access. Every function takes its executor explicitly; calls that
//! belong to a transactional unit of work receive the transaction's
//! connection and never fall back to an un-scoped pool handle.

use sqlx::SqliteExecutor;

use crate::error::AppError;
use crate::models::{Course, Enrollment, EnrollmentWithCourse, User, UserSummary};

pub async fn insert_user<'e>(ex: impl SqliteExecutor<'e>, user: &User) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO users (id, name, email, role, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(&user.id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(user.role)
    .bind(&user.created_at)
    .execute(ex)
    .await
    .map(|_| ())
    .map_err(AppError::from_storage)
}

pub async fn find_user_summary<'e>(
    ex: impl SqliteExecutor<'e>,
    id: &str,
) -> Result<Option<UserSummary>, AppError> {
    sqlx::query_as::<_, UserSummary>("SELECT id, name FROM users WHERE id = ?1")
        .bind(id)
        .fetch_optional(ex)
        .await
        .map_err(AppError::from_storage)
}

pub async fn insert_course<'e>(ex: impl SqliteExecutor<'e>, course: &Course) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO courses
            (id, instructor_id, title, description, price, is_published,
            max_students, enrollment_count, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&course.id)
    .bind(&course.instructor_id)
    .bind(&course.title)
    .bind(&course.description)
    .bind(course.price)
    .bind(course.is_published)
    .bind(course.max_students)
    .bind(course.enrollment_count)
    .bind(&course.created_at)
    .bind(&course.updated_at)
    .execute(ex)
    .await
    .map(|_| ())
    .map_err(AppError::from_storage)
}

pub async fn update_course<'e>(ex: impl SqliteExecutor<'e>, course: &Course) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE courses
        SET title = ?1,
            description = ?2,
            price = ?3,
            is_published = ?4,
            max_students = ?5,
            updated_at = ?6
        WHERE id = ?7
        "#,
    )
    .bind(&course.title)
    .bind(&course.description)
    .bind(course.price)
    .bind(course.is_published)
    .bind(course.max_students)
    .bind(&course.updated_at)
    .bind(&course.id)
    .execute(ex)
    .await
    .map(|_| ())
    .map_err(AppError::from_storage)
}

pub async fn fetch_published_courses<'e>(
    ex: impl SqliteExecutor<'e>,
) -> Result<Vec<Course>, AppError> {
    sqlx::query_as::<_, Course>(
        r#"
        SELECT id, instructor_id, title, description, price, is_published,
               max_students, enrollment_count, created_at, updated_at
        FROM courses
        WHERE is_published = 1
        ORDER BY updated_at DESC
        "#,
    )
    .fetch_all(ex)
    .await
    .map_err(AppError::from_storage)
}

pub async fn find_course_by_id<'e>(
    ex: impl SqliteExecutor<'e>,
    id: &str,
) -> Result<Option<Course>, AppError> {
    sqlx::query_as::<_, Course>(
        r#"
        SELECT id, instructor_id, title, description, price, is_published,
               max_students, enrollment_count, created_at, updated_at
        FROM courses
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(ex)
    .await
    .map_err(AppError::from_storage)
}

/// Live count of enrollments holding a seat (everything but `dropped`).
/// Capacity checks use this instead of the denormalized counter.
pub async fn count_seated_enrollments<'e>(
    ex: impl SqliteExecutor<'e>,
    course_id: &str,
) -> Result<i64, AppError> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM enrollments WHERE course_id = ?1 AND status != 'dropped'",
    )
    .bind(course_id)
    .fetch_one(ex)
    .await
    .map_err(AppError::from_storage)
}

/// Enrollments that block course deletion.
pub async fn count_active_enrollments<'e>(
    ex: impl SqliteExecutor<'e>,
    course_id: &str,
) -> Result<i64, AppError> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM enrollments WHERE course_id = ?1 AND status IN ('enrolled', 'in-progress')",
    )
    .bind(course_id)
    .fetch_one(ex)
    .await
    .map_err(AppError::from_storage)
}

pub async fn find_enrollment_by_id<'e>(
    ex: impl SqliteExecutor<'e>,
    id: &str,
) -> Result<Option<Enrollment>, AppError> {
    sqlx::query_as::<_, Enrollment>(
        r#"
        SELECT id, student_id, course_id, status, completion_percentage,
               final_grade, enrollment_date, updated_at
        FROM enrollments
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(ex)
    .await
    .map_err(AppError::from_storage)
}

pub async fn find_enrollment_for_student<'e>(
    ex: impl SqliteExecutor<'e>,
    student_id: &str,
    course_id: &str,
) -> Result<Option<Enrollment>, AppError> {
    sqlx::query_as::<_, Enrollment>(
        r#"
        SELECT id, student_id, course_id, status, completion_percentage,
               final_grade, enrollment_date, updated_at
        FROM enrollments
        WHERE student_id = ?1 AND course_id = ?2
        "#,
    )
    .bind(student_id)
    .bind(course_id)
    .fetch_optional(ex)
    .await
    .map_err(AppError::from_storage)
}

/// Inserts a new enrollment row. The `(student_id, course_id)` unique
/// index is the storage-level backstop for duplicate enrollments; a
/// violation surfaces as the same `AlreadyEnrolled` the in-transaction
/// check raises, so callers see one error regardless of which layer
/// caught the race.
pub async fn insert_enrollment<'e>(
    ex: impl SqliteExecutor<'e>,
    enrollment: &Enrollment,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO enrollments
            (id, student_id, course_id, status, completion_percentage,
            final_grade, enrollment_date, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&enrollment.id)
    .bind(&enrollment.student_id)
    .bind(&enrollment.course_id)
    .bind(enrollment.status)
    .bind(enrollment.completion_percentage)
    .bind(enrollment.final_grade)
    .bind(&enrollment.enrollment_date)
    .bind(&enrollment.updated_at)
    .execute(ex)
    .await
    .map(|_| ())
    .map_err(|err| match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::AlreadyEnrolled,
        _ => AppError::from_storage(err),
    })
}

pub async fn update_enrollment<'e>(
    ex: impl SqliteExecutor<'e>,
    enrollment: &Enrollment,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE enrollments
        SET status = ?1,
            completion_percentage = ?2,
            final_grade = ?3,
            updated_at = ?4
        WHERE id = ?5
        "#,
    )
    .bind(enrollment.status)
    .bind(enrollment.completion_percentage)
    .bind(enrollment.final_grade)
    .bind(&enrollment.updated_at)
    .bind(&enrollment.id)
    .execute(ex)
    .await
    .map(|_| ())
    .map_err(AppError::from_storage)
}

/// Atomic storage-level adjustment of the denormalized seat counter.
/// Only enrollment transactions call this.
pub async fn bump_enrollment_count<'e>(
    ex: impl SqliteExecutor<'e>,
    course_id: &str,
    delta: i64,
) -> Result<(), AppError> {
    sqlx::query("UPDATE courses SET enrollment_count = enrollment_count + ?1 WHERE id = ?2")
        .bind(delta)
        .bind(course_id)
        .execute(ex)
        .await
        .map(|_| ())
        .map_err(AppError::from_storage)
}

pub async fn fetch_enrollments_for_student<'e>(
    ex: impl SqliteExecutor<'e>,
    student_id: &str,
) -> Result<Vec<EnrollmentWithCourse>, AppError> {
    sqlx::query_as::<_, EnrollmentWithCourse>(
        r#"
        SELECT e.id, e.student_id, e.course_id, e.status,
               e.completion_percentage, e.final_grade, e.enrollment_date,
               e.updated_at, c.title AS course_title
        FROM enrollments e
        JOIN courses c ON c.id = e.course_id
        WHERE e.student_id = ?1
        ORDER BY e.enrollment_date DESC
        "#,
    )
    .bind(student_id)
    .fetch_all(ex)
    .await
    .map_err(AppError::from_storage)
}

pub async fn delete_enrollments_for_course<'e>(
    ex: impl SqliteExecutor<'e>,
    course_id: &str,
) -> Result<u64, AppError> {
    sqlx::query("DELETE FROM enrollments WHERE course_id = ?1")
        .bind(course_id)
        .execute(ex)
        .await
        .map(|r| r.rows_affected())
        .map_err(AppError::from_storage)
}

pub async fn delete_course<'e>(ex: impl SqliteExecutor<'e>, id: &str) -> Result<(), AppError> {
    sqlx::query("DELETE FROM courses WHERE id = ?1")
        .bind(id)
        .execute(ex)
        .await
        .map(|_| ())
        .map_err(AppError::from_storage)
}
