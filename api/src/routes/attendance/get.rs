//! Attendance read-only routes: sessions by course, records by session,
//! and a student's own per-course history.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use std::collections::HashMap;

use crate::{auth::AuthUser, response::ApiResponse};
use db::models::user::{Column as UserCol, Entity as UserEntity};
use services::ledger::AttendanceLedger;
use util::state::AppState;

use super::common::{
    AttendanceRecordResponse, HistoryEntryResponse, SessionListItem, error_response,
};

/// GET `/api/v1/attendance/course/{course_id}`
///
/// List every session the course has had, oldest first, each with its
/// derived presence count.
///
/// **Auth**: lecturer of the course (router layer).
pub async fn list_course_sessions(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
) -> (StatusCode, Json<ApiResponse<Vec<SessionListItem>>>) {
    let db = state.db();

    let sessions = match AttendanceLedger::sessions_by_course(db, course_id).await {
        Ok(v) => v,
        Err(e) => return error_response(e),
    };

    let session_ids: Vec<i64> = sessions.iter().map(|s| s.id).collect();
    let counts = AttendanceLedger::record_counts_for(db, &session_ids)
        .await
        .unwrap_or_default();

    let items = sessions
        .into_iter()
        .map(|s| {
            let attended = *counts.get(&s.id).unwrap_or(&0);
            SessionListItem::from_with_count(s, attended)
        })
        .collect();

    (
        StatusCode::OK,
        Json(ApiResponse::success(items, "Attendance sessions retrieved")),
    )
}

/// GET `/api/v1/attendance/session/{session_id}/records`
///
/// List stored records for a session in scan order, with student codes and
/// names resolved.
///
/// **Auth**: lecturer of the course owning the session (router layer).
pub async fn list_session_records(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
) -> (StatusCode, Json<ApiResponse<Vec<AttendanceRecordResponse>>>) {
    let db = state.db();

    let records = match AttendanceLedger::records_by_session(db, session_id).await {
        Ok(v) => v,
        Err(e) => return error_response(e),
    };

    // Resolve student identities for the rows we are returning.
    let student_ids: Vec<i64> = records.iter().map(|r| r.student_id).collect();
    let mut students = HashMap::new();
    if !student_ids.is_empty() {
        let users = UserEntity::find()
            .filter(UserCol::Id.is_in(student_ids))
            .all(db)
            .await
            .unwrap_or_default();
        for u in users {
            students.insert(u.id, u);
        }
    }

    let rows = records
        .into_iter()
        .map(|r| {
            let mut resp = AttendanceRecordResponse::from(r);
            if let Some(u) = students.get(&resp.student_id) {
                resp.student_code = Some(u.username.clone());
                resp.full_name = Some(u.full_name.clone());
            }
            resp
        })
        .collect();

    (
        StatusCode::OK,
        Json(ApiResponse::success(rows, "Attendance records retrieved")),
    )
}

/// GET `/api/v1/attendance/history/{course_id}`
///
/// The calling student's outcome for every session the course has had:
/// one entry per session, `ABSENT` where no record exists.
///
/// **Auth**: student enrolled on the course (router layer).
pub async fn my_history(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<Vec<HistoryEntryResponse>>>) {
    let db = state.db();

    match AttendanceLedger::history(db, claims.sub, course_id).await {
        Ok(entries) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                entries
                    .into_iter()
                    .map(HistoryEntryResponse::from)
                    .collect::<Vec<_>>(),
                "Attendance history retrieved",
            )),
        ),
        Err(e) => error_response(e),
    }
}
