use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::response::ApiResponse;
use services::ledger::AttendanceLedger;
use util::state::AppState;

use super::common::{AttendanceRecordResponse, UpdateRecordReq, error_response};

/// PUT `/api/v1/attendance/record/{record_id}`
///
/// Lecturer correction of a recorded outcome (status and optional note).
/// This is the only mutation a record permits after creation.
///
/// **Auth**: lecturer of the course owning the record (router layer).
pub async fn update_record(
    State(state): State<AppState>,
    Path(record_id): Path<i64>,
    Json(body): Json<UpdateRecordReq>,
) -> (StatusCode, Json<ApiResponse<Option<AttendanceRecordResponse>>>) {
    let db = state.db();

    match AttendanceLedger::override_record(db, record_id, body.status, body.note).await {
        Ok(record) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                Some(AttendanceRecordResponse::from(record)),
                "Attendance record updated",
            )),
        ),
        Err(e) => error_response(e),
    }
}
