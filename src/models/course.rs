use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: String,
    pub instructor_id: String,
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub is_published: bool,
    /// Optional capacity; `None` means unlimited.
    pub max_students: Option<i64>,
    /// Denormalized count of non-dropped enrollments. Maintained only
    /// inside enrollment transactions and never consulted for capacity
    /// decisions, which count live rows instead.
    pub enrollment_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCourseRequest {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub is_published: bool,
    pub max_students: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCourseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub is_published: Option<bool>,
    pub max_students: Option<i64>,
}
