use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use util::state::AppState;

mod get;
mod post;

pub use get::{export_statistics, get_statistics};
pub use post::send_ban_notifications;

use crate::auth::guards::require_course_lecturer;

pub fn courses_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/{course_id}/statistics",
            get(get_statistics).route_layer(from_fn_with_state(
                app_state.clone(),
                require_course_lecturer,
            )),
        )
        .route(
            "/{course_id}/send-ban-notifications",
            post(send_ban_notifications).route_layer(from_fn_with_state(
                app_state.clone(),
                require_course_lecturer,
            )),
        )
        .route(
            "/{course_id}/export",
            get(export_statistics).route_layer(from_fn_with_state(
                app_state.clone(),
                require_course_lecturer,
            )),
        )
}
