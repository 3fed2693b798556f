//! HTTP route entry point for `/api/v1/...`.
//!
//! Route groups:
//! - `/health` → liveness check (public)
//! - `/attendance` → session lifecycle, check-in, and attendance reads
//! - `/courses` → per-course statistics, ban notifications, report export

use axum::{Router, middleware::from_fn};
use util::state::AppState;

use crate::auth::guards::allow_authenticated;
use crate::routes::{
    attendance::attendance_routes, courses::courses_routes, health::health_routes,
};

pub mod attendance;
pub mod courses;
pub mod health;

/// Builds the complete application router for all HTTP endpoints.
///
/// The `/attendance` and `/courses` groups require authentication; finer
/// per-course capability checks (lecturer ownership, enrollment) are applied
/// per route or inside the handlers that take the course from the body.
pub fn routes(app_state: AppState) -> Router {
    Router::new()
        .nest("/health", health_routes())
        .nest(
            "/attendance",
            attendance_routes(app_state.clone()).route_layer(from_fn(allow_authenticated)),
        )
        .nest(
            "/courses",
            courses_routes(app_state.clone()).route_layer(from_fn(allow_authenticated)),
        )
        .with_state(app_state)
}
