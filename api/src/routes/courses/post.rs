use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use sea_orm::EntityTrait;
use serde::Serialize;

use crate::response::ApiResponse;
use crate::routes::attendance::error_response;
use db::models::course;
use services::hooks::{BanNotifier, TracingBanNotifier};
use services::statistics::StatisticsService;
use util::state::AppState;

#[derive(Debug, Serialize, Default)]
pub struct NotificationSummary {
    pub banned_students: u32,
    pub notified: u32,
}

/// POST `/api/v1/courses/{course_id}/send-ban-notifications`
///
/// Hands the banned slice of the course's statistics to the configured
/// notifier. Delivery itself is an external concern; this endpoint reports
/// how many notifications were handed over.
///
/// **Auth**: lecturer of the course (router layer).
pub async fn send_ban_notifications(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
) -> (StatusCode, Json<ApiResponse<NotificationSummary>>) {
    let db = state.db();

    let Ok(Some(course)) = course::Entity::find_by_id(course_id).one(db).await else {
        return (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Course not found")),
        );
    };

    let stats = match StatisticsService::evaluate(db, course_id).await {
        Ok(v) => v,
        Err(e) => return error_response(e),
    };

    let banned: Vec<_> = stats.into_iter().filter(|s| s.is_banned).collect();

    let notifier = TracingBanNotifier;
    match notifier.notify_banned(&course, &banned).await {
        Ok(notified) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                NotificationSummary {
                    banned_students: banned.len() as u32,
                    notified,
                },
                "Ban notifications queued",
            )),
        ),
        Err(e) => error_response(e),
    }
}
