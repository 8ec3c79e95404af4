mod common;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use coursehub::routes::router;
use coursehub::state::AppState;

use common::{seed_course, seed_user, service, test_pool};

async fn app() -> (Router, sqlx::SqlitePool) {
    let pool = test_pool().await;
    let state = AppState {
        db: pool.clone(),
        enrollments: service(&pool),
    };
    (router(state), pool)
}

fn enroll_request(course_id: &str, user_id: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/courses/{course_id}/enroll"))
        .header("x-user-id", user_id)
        .header("x-user-role", "student")
        .body(Body::empty())
        .expect("failed to build request")
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    serde_json::from_slice(&bytes).expect("body was not valid json")
}

#[tokio::test]
async fn health_reports_ok() {
    let (app, _pool) = app().await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .expect("request failed");

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn enroll_over_http_returns_enrollment_view() {
    let (app, pool) = app().await;
    seed_user(&pool, "inst-1", "Ingrid", "instructor").await;
    seed_user(&pool, "stud-1", "Alice", "student").await;
    seed_course(&pool, "course-1", "inst-1", true, None).await;

    let response = app
        .oneshot(enroll_request("course-1", "stud-1"))
        .await
        .expect("request failed");

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "enrolled");
    assert_eq!(body["course_title"], "Course course-1");
    assert_eq!(body["student_name"], "Alice");
}

#[tokio::test]
async fn enroll_without_identity_is_forbidden() {
    let (app, pool) = app().await;
    seed_user(&pool, "inst-1", "Ingrid", "instructor").await;
    seed_course(&pool, "course-1", "inst-1", true, None).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/courses/course-1/enroll")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("request failed");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn duplicate_enroll_over_http_conflicts() {
    let (app, pool) = app().await;
    seed_user(&pool, "inst-1", "Ingrid", "instructor").await;
    seed_user(&pool, "stud-1", "Alice", "student").await;
    seed_course(&pool, "course-1", "inst-1", true, None).await;

    let first = app
        .clone()
        .oneshot(enroll_request("course-1", "stud-1"))
        .await
        .expect("request failed");
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .oneshot(enroll_request("course-1", "stud-1"))
        .await
        .expect("request failed");
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn enrolling_into_unpublished_course_is_bad_request() {
    let (app, pool) = app().await;
    seed_user(&pool, "inst-1", "Ingrid", "instructor").await;
    seed_user(&pool, "stud-1", "Alice", "student").await;
    seed_course(&pool, "course-1", "inst-1", false, None).await;

    let response = app
        .oneshot(enroll_request("course-1", "stud-1"))
        .await
        .expect("request failed");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn course_creation_requires_instructor_role() {
    let (app, pool) = app().await;
    seed_user(&pool, "stud-1", "Alice", "student").await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/courses")
                .header("x-user-id", "stud-1")
                .header("x-user-role", "student")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"title": "Sneaky Course"}"#))
                .unwrap(),
        )
        .await
        .expect("request failed");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
