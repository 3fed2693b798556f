use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode},
};
use sea_orm::EntityTrait;

use crate::response::ApiResponse;
use crate::routes::attendance::error_response;
use db::models::course;
use services::hooks::{CsvReportExporter, ReportExporter};
use services::statistics::{StatisticsService, StudentCourseStatistics};
use util::state::AppState;

/// GET `/api/v1/courses/{course_id}/statistics`
///
/// Per-student attendance totals and the ban determination, in roster
/// (enrollment) order.
///
/// **Auth**: lecturer of the course (router layer).
pub async fn get_statistics(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
) -> (StatusCode, Json<ApiResponse<Vec<StudentCourseStatistics>>>) {
    let db = state.db();

    match StatisticsService::evaluate(db, course_id).await {
        Ok(stats) => (
            StatusCode::OK,
            Json(ApiResponse::success(stats, "Statistics retrieved")),
        ),
        Err(e) => error_response(e),
    }
}

/// GET `/api/v1/courses/{course_id}/export`
///
/// The same statistics array as a downloadable CSV report.
///
/// **Auth**: lecturer of the course (router layer).
pub async fn export_statistics(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
) -> (StatusCode, (HeaderMap, String)) {
    let db = state.db();

    let plain_headers = || {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        headers
    };

    // The guard already confirmed the course exists; a miss here is a race
    // with a concurrent delete.
    let Ok(Some(course)) = course::Entity::find_by_id(course_id).one(db).await else {
        return (
            StatusCode::NOT_FOUND,
            (plain_headers(), "course not found".to_string()),
        );
    };

    let stats = match StatisticsService::evaluate(db, course_id).await {
        Ok(v) => v,
        Err(e) => {
            tracing::error!(error = %e, course_id, "failed to evaluate statistics for export");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                (plain_headers(), "error".to_string()),
            );
        }
    };

    let exporter = CsvReportExporter;
    let body = match exporter.export(&course, &stats) {
        Ok(bytes) => String::from_utf8(bytes).unwrap_or_default(),
        Err(e) => {
            tracing::error!(error = %e, course_id, "failed to render report");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                (plain_headers(), "error".to_string()),
            );
        }
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        axum::http::header::CONTENT_TYPE,
        HeaderValue::from_static("text/csv; charset=utf-8"),
    );
    headers.insert(
        axum::http::header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!(
            "attachment; filename=\"{}\"",
            exporter.file_name(&course)
        ))
        .unwrap_or(HeaderValue::from_static("attachment")),
    );

    (StatusCode::OK, (headers, body))
}
