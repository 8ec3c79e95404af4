#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

use coursehub::services::{DbUserDirectory, EnrollmentService, RetryPolicy};

pub async fn test_pool() -> SqlitePool {
    // A single connection keeps every in-memory test deterministic: the
    // pool serializes transactional units the same way SQLite serializes
    // writers in production.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("failed to open in-memory database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("failed to run migrations");
    pool
}

pub fn service(pool: &SqlitePool) -> EnrollmentService {
    EnrollmentService::new(
        pool.clone(),
        RetryPolicy::default(),
        Arc::new(DbUserDirectory::new(pool.clone())),
    )
}

pub async fn seed_user(pool: &SqlitePool, id: &str, name: &str, role: &str) {
    sqlx::query("INSERT INTO users (id, name, email, role, created_at) VALUES (?1, ?2, ?3, ?4, ?5)")
        .bind(id)
        .bind(name)
        .bind(format!("{id}@example.com"))
        .bind(role)
        .bind(Utc::now().to_rfc3339())
        .execute(pool)
        .await
        .expect("failed to seed user");
}

pub async fn seed_course(
    pool: &SqlitePool,
    id: &str,
    instructor_id: &str,
    is_published: bool,
    max_students: Option<i64>,
) {
    sqlx::query(
        r#"
        INSERT INTO courses
            (id, instructor_id, title, description, price, is_published,
            max_students, enrollment_count, created_at, updated_at)
        VALUES (?1, ?2, ?3, NULL, 49.0, ?4, ?5, 0, ?6, ?6)
        "#,
    )
    .bind(id)
    .bind(instructor_id)
    .bind(format!("Course {id}"))
    .bind(is_published)
    .bind(max_students)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await
    .expect("failed to seed course");
}

pub async fn enrollment_counter(pool: &SqlitePool, course_id: &str) -> i64 {
    sqlx::query_scalar("SELECT enrollment_count FROM courses WHERE id = ?1")
        .bind(course_id)
        .fetch_one(pool)
        .await
        .expect("failed to read enrollment counter")
}

pub async fn enrollment_rows(pool: &SqlitePool, course_id: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM enrollments WHERE course_id = ?1")
        .bind(course_id)
        .fetch_one(pool)
        .await
        .expect("failed to count enrollments")
}
