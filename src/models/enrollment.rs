use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle of an enrollment. `Completed` and `Dropped` are terminal;
/// nothing transitions out of either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "kebab-case")]
#[sqlx(rename_all = "kebab-case")]
pub enum EnrollmentStatus {
    Enrolled,
    InProgress,
    Completed,
    Dropped,
}

impl EnrollmentStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, EnrollmentStatus::Completed | EnrollmentStatus::Dropped)
    }

    /// Active enrollments block course deletion.
    pub fn is_active(self) -> bool {
        matches!(self, EnrollmentStatus::Enrolled | EnrollmentStatus::InProgress)
    }

    /// A dropped enrollment frees its seat; everything else holds one.
    pub fn holds_seat(self) -> bool {
        !matches!(self, EnrollmentStatus::Dropped)
    }

    pub fn can_transition_to(self, next: EnrollmentStatus) -> bool {
        match self {
            EnrollmentStatus::Enrolled => true,
            EnrollmentStatus::InProgress => !matches!(next, EnrollmentStatus::Enrolled),
            EnrollmentStatus::Completed | EnrollmentStatus::Dropped => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Enrollment {
    pub id: String,
    pub student_id: String,
    pub course_id: String,
    pub status: EnrollmentStatus,
    pub completion_percentage: f64,
    pub final_grade: Option<f64>,
    pub enrollment_date: String,
    pub updated_at: String,
}

impl Enrollment {
    pub fn new(student_id: &str, course_id: &str) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            id: Uuid::new_v4().to_string(),
            student_id: student_id.to_string(),
            course_id: course_id.to_string(),
            status: EnrollmentStatus::Enrolled,
            completion_percentage: 0.0,
            final_grade: None,
            enrollment_date: now.clone(),
            updated_at: now,
        }
    }
}

/// Clamps a percentage-scale value into [0, 100].
pub fn clamp_percentage(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateProgressRequest {
    pub completion_percentage: Option<f64>,
    pub final_grade: Option<f64>,
    pub status: Option<EnrollmentStatus>,
}

/// Enrollment joined with minimal course/student display fields, returned
/// from `enroll`.
#[derive(Debug, Clone, Serialize)]
pub struct EnrollmentView {
    #[serde(flatten)]
    pub enrollment: Enrollment,
    pub course_title: String,
    pub student_name: Option<String>,
}

/// Row shape for a student's enrollment listing.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct EnrollmentWithCourse {
    pub id: String,
    pub student_id: String,
    pub course_id: String,
    pub status: EnrollmentStatus,
    pub completion_percentage: f64,
    pub final_grade: Option<f64>,
    pub enrollment_date: String,
    pub updated_at: String,
    pub course_title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_have_no_outgoing_transitions() {
        for next in [
            EnrollmentStatus::Enrolled,
            EnrollmentStatus::InProgress,
            EnrollmentStatus::Completed,
            EnrollmentStatus::Dropped,
        ] {
            assert!(!EnrollmentStatus::Completed.can_transition_to(next));
            assert!(!EnrollmentStatus::Dropped.can_transition_to(next));
        }
    }

    #[test]
    fn in_progress_cannot_regress_to_enrolled() {
        assert!(!EnrollmentStatus::InProgress.can_transition_to(EnrollmentStatus::Enrolled));
        assert!(EnrollmentStatus::InProgress.can_transition_to(EnrollmentStatus::Completed));
        assert!(EnrollmentStatus::InProgress.can_transition_to(EnrollmentStatus::Dropped));
    }

    #[test]
    fn dropped_does_not_hold_a_seat() {
        assert!(EnrollmentStatus::Enrolled.holds_seat());
        assert!(EnrollmentStatus::InProgress.holds_seat());
        assert!(EnrollmentStatus::Completed.holds_seat());
        assert!(!EnrollmentStatus::Dropped.holds_seat());
    }

    #[test]
    fn percentages_clamp_into_range() {
        assert_eq!(clamp_percentage(150.0), 100.0);
        assert_eq!(clamp_percentage(-10.0), 0.0);
        assert_eq!(clamp_percentage(42.5), 42.5);
    }

    #[test]
    fn new_enrollment_starts_enrolled_at_zero() {
        let e = Enrollment::new("student-1", "course-1");
        assert_eq!(e.status, EnrollmentStatus::Enrolled);
        assert_eq!(e.completion_percentage, 0.0);
        assert!(e.final_grade.is_none());
    }
}
