//! The transactional enrollment & progress engine. Every mutation of the
//! enrollment set or the course seat counter goes through this service,
//! inside a transaction; no other code path touches either.

use std::sync::Arc;

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use crate::db::repository;
use crate::error::AppError;
use crate::models::enrollment::clamp_percentage;
use crate::models::{
    Enrollment, EnrollmentStatus, EnrollmentView, EnrollmentWithCourse, UpdateProgressRequest,
};
use crate::services::capacity;
use crate::services::directory::UserDirectory;
use crate::services::txn::{RetryPolicy, TxnExecutor, UnitFuture};

#[derive(Clone)]
pub struct EnrollmentService {
    db: SqlitePool,
    txn: TxnExecutor,
    users: Arc<dyn UserDirectory>,
}

impl EnrollmentService {
    pub fn new(db: SqlitePool, policy: RetryPolicy, users: Arc<dyn UserDirectory>) -> Self {
        let txn = TxnExecutor::new(db.clone(), policy);
        Self { db, txn, users }
    }

    /// Enrolls a student into a course. Course load, capacity check,
    /// duplicate check, enrollment insert, and counter bump all happen
    /// inside one transaction; transient conflicts retry the whole unit.
    pub async fn enroll(
        &self,
        course_id: &str,
        student_id: &str,
    ) -> Result<EnrollmentView, AppError> {
        let course_id = course_id.to_string();
        let student_id = student_id.to_string();

        let (enrollment, course_title) = self
            .txn
            .run_with_retry(move |conn: &mut SqliteConnection| {
                let course_id = course_id.clone();
                let student_id = student_id.clone();
                Box::pin(async move {
                    let course = repository::find_course_by_id(&mut *conn, &course_id)
                        .await?
                        .ok_or(AppError::NotFound("course"))?;

                    capacity::ensure_enrollable(&mut *conn, &course).await?;

                    if repository::find_enrollment_for_student(&mut *conn, &student_id, &course_id)
                        .await?
                        .is_some()
                    {
                        return Err(AppError::AlreadyEnrolled);
                    }

                    let enrollment = Enrollment::new(&student_id, &course_id);
                    repository::insert_enrollment(&mut *conn, &enrollment).await?;
                    repository::bump_enrollment_count(&mut *conn, &course_id, 1).await?;

                    Ok((enrollment, course.title))
                }) as UnitFuture<'_, (Enrollment, String)>
            })
            .await?;

        info!(
            course_id = %enrollment.course_id,
            student_id = %enrollment.student_id,
            "student enrolled"
        );

        let student_name = self
            .users
            .find_user(&enrollment.student_id)
            .await?
            .map(|u| u.name);

        Ok(EnrollmentView {
            enrollment,
            course_title,
            student_name,
        })
    }

    /// Applies a progress update on behalf of the owning student.
    /// Percentages clamp into [0, 100]; reaching 100 completes the
    /// enrollment unless it was explicitly closed in the same update.
    /// Terminal enrollments reject any update, so a dropped enrollment
    /// can never be revived.
    pub async fn update_progress(
        &self,
        enrollment_id: &str,
        student_id: &str,
        req: UpdateProgressRequest,
    ) -> Result<Enrollment, AppError> {
        let enrollment_id = enrollment_id.to_string();
        let student_id = student_id.to_string();

        self.txn
            .run_atomic(&mut move |conn: &mut SqliteConnection| {
                let enrollment_id = enrollment_id.clone();
                let student_id = student_id.clone();
                let req = req.clone();
                Box::pin(async move {
                    let current = repository::find_enrollment_by_id(&mut *conn, &enrollment_id)
                        .await?
                        .ok_or(AppError::NotFound("enrollment"))?;

                    if current.student_id != student_id {
                        return Err(AppError::Unauthorized);
                    }
                    if current.status.is_terminal() {
                        return Err(AppError::EnrollmentClosed);
                    }

                    let mut next = current.clone();
                    if let Some(pct) = req.completion_percentage {
                        next.completion_percentage = clamp_percentage(pct);
                    }
                    if let Some(grade) = req.final_grade {
                        next.final_grade = Some(clamp_percentage(grade));
                    }
                    if let Some(status) = req.status {
                        if !current.status.can_transition_to(status) {
                            return Err(AppError::Validation(format!(
                                "cannot move enrollment from {:?} to {:?}",
                                current.status, status
                            )));
                        }
                        next.status = status;
                    }

                    if next.completion_percentage >= 100.0
                        && !matches!(
                            next.status,
                            EnrollmentStatus::Completed | EnrollmentStatus::Dropped
                        )
                    {
                        next.status = EnrollmentStatus::Completed;
                    }

                    next.updated_at = Utc::now().to_rfc3339();
                    repository::update_enrollment(&mut *conn, &next).await?;

                    // A drop through a progress update frees the seat too.
                    if next.status == EnrollmentStatus::Dropped && current.status.holds_seat() {
                        repository::bump_enrollment_count(&mut *conn, &next.course_id, -1).await?;
                    }

                    Ok(next)
                }) as UnitFuture<'_, Enrollment>
            })
            .await
    }

    /// Withdraws the student from a course. `dropped` is terminal; there
    /// is no reversal operation.
    pub async fn withdraw(
        &self,
        enrollment_id: &str,
        student_id: &str,
    ) -> Result<Enrollment, AppError> {
        let enrollment_id = enrollment_id.to_string();
        let student_id = student_id.to_string();

        let dropped = self
            .txn
            .run_with_retry(move |conn: &mut SqliteConnection| {
                let enrollment_id = enrollment_id.clone();
                let student_id = student_id.clone();
                Box::pin(async move {
                    let current = repository::find_enrollment_by_id(&mut *conn, &enrollment_id)
                        .await?
                        .ok_or(AppError::NotFound("enrollment"))?;

                    if current.student_id != student_id {
                        return Err(AppError::Unauthorized);
                    }
                    if current.status == EnrollmentStatus::Completed {
                        return Err(AppError::CannotWithdrawCompleted);
                    }
                    if current.status == EnrollmentStatus::Dropped {
                        return Err(AppError::AlreadyWithdrawn);
                    }

                    let mut next = current;
                    next.status = EnrollmentStatus::Dropped;
                    next.updated_at = Utc::now().to_rfc3339();
                    repository::update_enrollment(&mut *conn, &next).await?;
                    repository::bump_enrollment_count(&mut *conn, &next.course_id, -1).await?;

                    Ok(next)
                }) as UnitFuture<'_, Enrollment>
            })
            .await?;

        info!(
            course_id = %dropped.course_id,
            student_id = %dropped.student_id,
            "student withdrew"
        );

        Ok(dropped)
    }

    /// Deletes a course together with its terminal enrollment rows.
    /// Rejected while any enrollment is still `enrolled` or
    /// `in-progress`.
    pub async fn delete_course(
        &self,
        course_id: &str,
        instructor_id: &str,
    ) -> Result<(), AppError> {
        let course_key = course_id.to_string();
        let instructor_id = instructor_id.to_string();

        let removed = self
            .txn
            .run_with_retry(move |conn: &mut SqliteConnection| {
                let course_id = course_key.clone();
                let instructor_id = instructor_id.clone();
                Box::pin(async move {
                    let course = repository::find_course_by_id(&mut *conn, &course_id)
                        .await?
                        .ok_or(AppError::NotFound("course"))?;

                    if course.instructor_id != instructor_id {
                        return Err(AppError::Unauthorized);
                    }

                    let active =
                        repository::count_active_enrollments(&mut *conn, &course_id).await?;
                    if active > 0 {
                        return Err(AppError::CourseHasActiveEnrollments);
                    }

                    let removed =
                        repository::delete_enrollments_for_course(&mut *conn, &course_id).await?;
                    repository::delete_course(&mut *conn, &course_id).await?;

                    Ok(removed)
                }) as UnitFuture<'_, u64>
            })
            .await?;

        info!(course_id, removed_enrollments = removed, "course deleted");
        Ok(())
    }

    pub async fn list_for_student(
        &self,
        student_id: &str,
    ) -> Result<Vec<EnrollmentWithCourse>, AppError> {
        repository::fetch_enrollments_for_student(&self.db, student_id).await
    }
}
