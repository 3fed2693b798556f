use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post, put},
};
use util::state::AppState;

mod common;
mod get;
mod post;
mod put;

pub use common::error_response;
pub use get::{list_course_sessions, list_session_records, my_history};
pub use post::{check_in, close_session, start_session};
pub use put::update_record;

use crate::auth::guards::{require_course_lecturer, require_course_student};

pub fn attendance_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        // Session lifecycle and check-in carry the course in the body;
        // their capability checks run inside the handlers.
        .route("/start-session", post(start_session))
        .route("/close-session", post(close_session))
        .route("/check-in", post(check_in))
        .route(
            "/course/{course_id}",
            get(list_course_sessions).route_layer(from_fn_with_state(
                app_state.clone(),
                require_course_lecturer,
            )),
        )
        .route(
            "/session/{session_id}/records",
            get(list_session_records).route_layer(from_fn_with_state(
                app_state.clone(),
                require_course_lecturer,
            )),
        )
        .route(
            "/history/{course_id}",
            get(my_history).route_layer(from_fn_with_state(
                app_state.clone(),
                require_course_student,
            )),
        )
        .route(
            "/record/{record_id}",
            put(update_record).route_layer(from_fn_with_state(
                app_state.clone(),
                require_course_lecturer,
            )),
        )
}
