use axum::{Extension, Json, extract::State, http::StatusCode};
use common::format_validation_errors;
use sea_orm::{DatabaseConnection, EntityTrait};
use validator::Validate;

use crate::{auth::AuthUser, response::ApiResponse};
use db::models::course;
use services::check_in::{CheckInService, LatePolicy};
use services::session::AttendanceSessionService;
use util::state::AppState;

use super::common::{
    AttendanceSessionResponse, CheckInReq, CheckInResponse, CloseSessionReq, CloseSessionResponse,
    StartSessionReq, error_response,
};

/// Session open/close take the course from the request body, so lecturer
/// ownership is checked here rather than by a path-based guard.
async fn authorize_course_lecturer<T>(
    db: &DatabaseConnection,
    course_id: i64,
    claims: &crate::auth::Claims,
) -> Result<(), (StatusCode, Json<ApiResponse<T>>)>
where
    T: serde::Serialize + Default,
{
    match course::Entity::find_by_id(course_id).one(db).await {
        Ok(Some(c)) if claims.admin || c.is_lectured_by(claims.sub) => Ok(()),
        Ok(Some(_)) => Err((
            StatusCode::FORBIDDEN,
            Json(ApiResponse::error(
                "Lecturer access required for this course",
            )),
        )),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Course not found")),
        )),
        Err(e) => {
            tracing::error!(error = %e, course_id, "failed to load course for authorization");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Internal server error")),
            ))
        }
    }
}

/// POST `/api/v1/attendance/start-session`
///
/// Opens a fresh attendance session for the course, superseding any session
/// still open. The response carries the QR payload to display.
///
/// **Auth**: lecturer of the course (or admin).
pub async fn start_session(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(body): Json<StartSessionReq>,
) -> (StatusCode, Json<ApiResponse<AttendanceSessionResponse>>) {
    let db = state.db();

    if let Err(resp) = authorize_course_lecturer(db, body.course_id, &claims).await {
        return resp;
    }

    match AttendanceSessionService::open_session(db, body.course_id).await {
        Ok(session) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(
                AttendanceSessionResponse::from(session),
                "Attendance session opened",
            )),
        ),
        Err(e) => error_response(e),
    }
}

/// POST `/api/v1/attendance/close-session`
///
/// Closes the open session for the course. Responds 404 when nothing is
/// open — including a repeated close — so a stale client notices.
///
/// **Auth**: lecturer of the course (or admin).
pub async fn close_session(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(body): Json<CloseSessionReq>,
) -> (StatusCode, Json<ApiResponse<CloseSessionResponse>>) {
    let db = state.db();

    if let Err(resp) = authorize_course_lecturer(db, body.course_id, &claims).await {
        return resp;
    }

    match AttendanceSessionService::close_session(db, body.course_id).await {
        Ok(session) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                CloseSessionResponse {
                    status: Some(session.status),
                },
                "Attendance session closed",
            )),
        ),
        Err(e) => error_response(e),
    }
}

/// POST `/api/v1/attendance/check-in`
///
/// Records the calling student as present for the course's open session.
/// The submitted QR payload must match the session's current token; roster
/// membership and the one-record-per-student rule are enforced downstream.
///
/// **Auth**: any authenticated user; non-enrolled callers get 403.
pub async fn check_in(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(body): Json<CheckInReq>,
) -> (StatusCode, Json<ApiResponse<CheckInResponse>>) {
    let db = state.db();

    if let Err(e) = body.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format_validation_errors(&e))),
        );
    }

    match CheckInService::check_in(
        db,
        claims.sub,
        body.course_id,
        &body.qr_code_data,
        LatePolicy::from_config(),
    )
    .await
    {
        Ok(record) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                CheckInResponse {
                    record_id: record.id,
                    status: Some(record.status),
                    check_in_time: record.checked_in_at.map(|t| t.to_rfc3339()),
                },
                "Attendance recorded",
            )),
        ),
        Err(e) => error_response(e),
    }
}
