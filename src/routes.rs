use axum::Json;
use axum::extract::Path;
use axum::routing::{patch, post};
use axum::{Router, extract::State, http::StatusCode, routing::get};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::Identity;
use crate::db::repository;
use crate::error::AppError;
use crate::models::*;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/users", post(register_user))
        .route("/courses", get(list_courses).post(create_course))
        .route(
            "/courses/{id}",
            get(get_course).patch(update_course).delete(delete_course),
        )
        .route("/courses/{id}/enroll", post(enroll))
        .route("/enrollments", get(list_my_enrollments))
        .route("/enrollments/{id}/progress", patch(update_progress))
        .route("/enrollments/{id}/withdraw", post(withdraw))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1")
        .execute(&state.db)
        .await
        .map_err(AppError::from_storage)?;
    Ok(StatusCode::OK)
}

async fn register_user(
    State(state): State<AppState>,
    Json(req): Json<NewUserRequest>,
) -> Result<Json<User>, AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("name must not be empty".to_string()));
    }
    if req.email.trim().is_empty() || !req.email.contains('@') {
        return Err(AppError::Validation("email is not valid".to_string()));
    }

    let user = User {
        id: Uuid::new_v4().to_string(),
        name: req.name,
        email: req.email,
        role: req.role,
        created_at: Utc::now().to_rfc3339(),
    };
    repository::insert_user(&state.db, &user).await?;
    Ok(Json(user))
}

async fn list_courses(State(state): State<AppState>) -> Result<Json<Vec<Course>>, AppError> {
    let courses = repository::fetch_published_courses(&state.db).await?;
    Ok(Json(courses))
}

fn validate_course_fields(
    title: Option<&str>,
    price: Option<f64>,
    max_students: Option<i64>,
) -> Result<(), AppError> {
    if let Some(title) = title {
        if title.trim().is_empty() {
            return Err(AppError::Validation("title must not be empty".to_string()));
        }
    }
    if let Some(price) = price {
        if !price.is_finite() || price < 0.0 {
            return Err(AppError::Validation("price must be non-negative".to_string()));
        }
    }
    if let Some(max) = max_students {
        if max < 1 {
            return Err(AppError::Validation(
                "max_students must be at least 1".to_string(),
            ));
        }
    }
    Ok(())
}

async fn create_course(
    State(state): State<AppState>,
    identity: Identity,
    Json(req): Json<NewCourseRequest>,
) -> Result<Json<Course>, AppError> {
    if !identity.role.can_manage_courses() {
        return Err(AppError::Unauthorized);
    }
    validate_course_fields(Some(req.title.as_str()), Some(req.price), req.max_students)?;

    let now = Utc::now().to_rfc3339();
    let course = Course {
        id: Uuid::new_v4().to_string(),
        instructor_id: identity.id,
        title: req.title,
        description: req.description,
        price: req.price,
        is_published: req.is_published,
        max_students: req.max_students,
        enrollment_count: 0,
        created_at: now.clone(),
        updated_at: now,
    };
    repository::insert_course(&state.db, &course).await?;
    Ok(Json(course))
}

async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Course>, AppError> {
    let course = repository::find_course_by_id(&state.db, &id)
        .await?
        .ok_or(AppError::NotFound("course"))?;
    Ok(Json(course))
}

async fn update_course(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
    Json(req): Json<UpdateCourseRequest>,
) -> Result<Json<Course>, AppError> {
    let mut course = repository::find_course_by_id(&state.db, &id)
        .await?
        .ok_or(AppError::NotFound("course"))?;
    if course.instructor_id != identity.id {
        return Err(AppError::Unauthorized);
    }
    validate_course_fields(req.title.as_deref(), req.price, req.max_students)?;

    if let Some(title) = req.title {
        course.title = title;
    }
    if let Some(description) = req.description {
        course.description = Some(description);
    }
    if let Some(price) = req.price {
        course.price = price;
    }
    if let Some(is_published) = req.is_published {
        course.is_published = is_published;
    }
    if let Some(max_students) = req.max_students {
        course.max_students = Some(max_students);
    }
    course.updated_at = Utc::now().to_rfc3339();

    repository::update_course(&state.db, &course).await?;
    Ok(Json(course))
}

async fn delete_course(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.enrollments.delete_course(&id, &identity.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn enroll(
    State(state): State<AppState>,
    identity: Identity,
    Path(course_id): Path<String>,
) -> Result<Json<EnrollmentView>, AppError> {
    let view = state.enrollments.enroll(&course_id, &identity.id).await?;
    Ok(Json(view))
}

async fn list_my_enrollments(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<EnrollmentWithCourse>>, AppError> {
    let enrollments = state.enrollments.list_for_student(&identity.id).await?;
    Ok(Json(enrollments))
}

async fn update_progress(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
    Json(req): Json<UpdateProgressRequest>,
) -> Result<Json<Enrollment>, AppError> {
    let enrollment = state
        .enrollments
        .update_progress(&id, &identity.id, req)
        .await?;
    Ok(Json(enrollment))
}

async fn withdraw(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<Enrollment>, AppError> {
    let enrollment = state.enrollments.withdraw(&id, &identity.id).await?;
    Ok(Json(enrollment))
}
