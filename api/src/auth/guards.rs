use axum::{
    Json,
    body::Body,
    extract::{FromRequestParts, Path, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use sea_orm::{DatabaseConnection, EntityTrait};
use std::collections::HashMap;

use crate::auth::claims::AuthUser;
use crate::response::ApiResponse;
use db::models::{attendance_record, attendance_session, course, course_student};
use util::state::AppState;

#[derive(serde::Serialize, Default)]
pub struct Empty;

type GuardError = (StatusCode, Json<ApiResponse<Empty>>);

/// Helper to extract and validate the user from request extensions and
/// insert it back into the request for downstream handlers.
async fn extract_and_insert_authuser(
    req: Request<Body>,
) -> Result<(Request<Body>, AuthUser), GuardError> {
    let (mut parts, body) = req.into_parts();
    let user = AuthUser::from_request_parts(&mut parts, &())
        .await
        .map_err(|_| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::error("Authentication required")),
            )
        })?;

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(user.clone());
    Ok((req, user))
}

/// Basic guard to ensure the request is authenticated.
pub async fn allow_authenticated(req: Request<Body>, next: Next) -> Result<Response, GuardError> {
    let (req, _user) = extract_and_insert_authuser(req).await?;

    Ok(next.run(req).await)
}

/// Resolves the course a request targets from whichever identifying path
/// parameter the route carries (`course_id`, `session_id`, or `record_id`).
async fn resolve_course_id(
    db: &DatabaseConnection,
    params: &HashMap<String, String>,
) -> Result<i64, GuardError> {
    if let Some(id) = params.get("course_id").and_then(|s| s.parse::<i64>().ok()) {
        return Ok(id);
    }

    let session_id = match params.get("session_id").and_then(|s| s.parse::<i64>().ok()) {
        Some(id) => Some(id),
        None => match params.get("record_id").and_then(|s| s.parse::<i64>().ok()) {
            Some(record_id) => attendance_record::Entity::find_by_id(record_id)
                .one(db)
                .await
                .map_err(db_guard_error)?
                .map(|r| r.session_id),
            None => {
                return Err((
                    StatusCode::BAD_REQUEST,
                    Json(ApiResponse::error("Missing or invalid resource identifier")),
                ));
            }
        },
    };

    let Some(session_id) = session_id else {
        return Err(not_found("Attendance record not found"));
    };

    attendance_session::Entity::find_by_id(session_id)
        .one(db)
        .await
        .map_err(db_guard_error)?
        .map(|s| s.course_id)
        .ok_or_else(|| not_found("Attendance session not found"))
}

/// Guard allowing only the lecturer who owns the targeted course (admins
/// bypass the ownership check).
pub async fn require_course_lecturer(
    State(app_state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, GuardError> {
    let db = app_state.db();
    let (req, user) = extract_and_insert_authuser(req).await?;

    let course_id = resolve_course_id(db, &params).await?;
    let Some(course) = course::Entity::find_by_id(course_id)
        .one(db)
        .await
        .map_err(db_guard_error)?
    else {
        return Err(not_found("Course not found"));
    };

    if user.0.admin || course.is_lectured_by(user.0.sub) {
        Ok(next.run(req).await)
    } else {
        Err((
            StatusCode::FORBIDDEN,
            Json(ApiResponse::error(
                "Lecturer access required for this course",
            )),
        ))
    }
}

/// Guard allowing only students enrolled on the targeted course (admins
/// bypass the roster check).
pub async fn require_course_student(
    State(app_state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, GuardError> {
    let db = app_state.db();
    let (req, user) = extract_and_insert_authuser(req).await?;

    let course_id = resolve_course_id(db, &params).await?;
    if course::Entity::find_by_id(course_id)
        .one(db)
        .await
        .map_err(db_guard_error)?
        .is_none()
    {
        return Err(not_found("Course not found"));
    }

    if user.0.admin {
        return Ok(next.run(req).await);
    }

    let enrolled = course_student::Model::is_enrolled(db, course_id, user.0.sub)
        .await
        .map_err(db_guard_error)?;

    if enrolled {
        Ok(next.run(req).await)
    } else {
        Err((
            StatusCode::FORBIDDEN,
            Json(ApiResponse::error("Not enrolled in this course")),
        ))
    }
}

fn not_found(msg: &str) -> GuardError {
    (StatusCode::NOT_FOUND, Json(ApiResponse::error(msg)))
}

fn db_guard_error(e: sea_orm::DbErr) -> GuardError {
    tracing::warn!(error = %e, "DB error while checking access; denying");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::error("Database error while checking access")),
    )
}
