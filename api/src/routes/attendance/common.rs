use axum::{Json, http::StatusCode};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::response::ApiResponse;
use db::models::attendance_record::RecordStatus;
use db::models::attendance_session::SessionStatus;
use services::AttendanceError;

/// Response for a freshly opened session; `qr_code_data` is the payload the
/// front end renders as a QR code.
#[derive(Debug, Serialize, Default)]
pub struct AttendanceSessionResponse {
    pub id: i64,
    pub course_id: i64,
    pub status: Option<SessionStatus>,
    pub qr_code_data: String,
    pub opened_at: String,
    pub closed_at: Option<String>,
}

impl From<db::models::attendance_session::Model> for AttendanceSessionResponse {
    fn from(m: db::models::attendance_session::Model) -> Self {
        Self {
            id: m.id,
            course_id: m.course_id,
            status: Some(m.status),
            qr_code_data: m.token,
            opened_at: m.opened_at.to_rfc3339(),
            closed_at: m.closed_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Listing entry for lecturers; omits the token and carries the derived
/// presence count instead.
#[derive(Debug, Serialize)]
pub struct SessionListItem {
    pub id: i64,
    pub course_id: i64,
    pub status: SessionStatus,
    pub opened_at: String,
    pub closed_at: Option<String>,
    pub attended_count: i64,
}

impl SessionListItem {
    pub fn from_with_count(m: db::models::attendance_session::Model, attended_count: i64) -> Self {
        Self {
            id: m.id,
            course_id: m.course_id,
            status: m.status,
            opened_at: m.opened_at.to_rfc3339(),
            closed_at: m.closed_at.map(|t| t.to_rfc3339()),
            attended_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AttendanceRecordResponse {
    pub id: i64,
    pub session_id: i64,
    pub student_id: i64,
    pub student_code: Option<String>,
    pub full_name: Option<String>,
    pub status: RecordStatus,
    pub check_in_time: Option<String>,
    pub note: Option<String>,
}

impl From<db::models::attendance_record::Model> for AttendanceRecordResponse {
    fn from(m: db::models::attendance_record::Model) -> Self {
        Self {
            id: m.id,
            session_id: m.session_id,
            student_id: m.student_id,
            student_code: None,
            full_name: None,
            status: m.status,
            check_in_time: m.checked_in_at.map(|t| t.to_rfc3339()),
            note: m.note,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryEntryResponse {
    pub session_id: i64,
    pub session_date: String,
    pub check_in_time: Option<String>,
    pub status: RecordStatus,
}

impl From<services::ledger::HistoryEntry> for HistoryEntryResponse {
    fn from(e: services::ledger::HistoryEntry) -> Self {
        Self {
            session_id: e.session_id,
            session_date: e.session_date.to_rfc3339(),
            check_in_time: e.check_in_time.map(|t| t.to_rfc3339()),
            status: e.status,
        }
    }
}

#[derive(Debug, Serialize, Default)]
pub struct CheckInResponse {
    pub record_id: i64,
    pub status: Option<RecordStatus>,
    pub check_in_time: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StartSessionReq {
    pub course_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct CloseSessionReq {
    pub course_id: i64,
}

#[derive(Debug, Serialize, Default)]
pub struct CloseSessionResponse {
    pub status: Option<SessionStatus>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CheckInReq {
    pub course_id: i64,
    #[validate(length(min = 1, message = "QR code data is required"))]
    pub qr_code_data: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRecordReq {
    pub status: RecordStatus,
    pub note: Option<String>,
}

/// Maps a service error to the HTTP status + envelope the client expects.
pub fn error_response<T>(err: AttendanceError) -> (StatusCode, Json<ApiResponse<T>>)
where
    T: Serialize + Default,
{
    let status = match &err {
        AttendanceError::NotFound(_) => StatusCode::NOT_FOUND,
        AttendanceError::InvalidSession => StatusCode::BAD_REQUEST,
        AttendanceError::NotEnrolled => StatusCode::FORBIDDEN,
        AttendanceError::DuplicateCheckIn => StatusCode::CONFLICT,
        AttendanceError::Validation(_) => StatusCode::BAD_REQUEST,
        AttendanceError::Db(e) => {
            tracing::error!(error = %e, "attendance operation failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Internal server error")),
            );
        }
    };
    (status, Json(ApiResponse::error(err.to_string())))
}
