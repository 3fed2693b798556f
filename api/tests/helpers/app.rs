use api::routes::routes;
use axum::{Router, body::Body, http::Request, response::Response};
use sea_orm::DatabaseConnection;
use std::convert::Infallible;
use tower::ServiceExt;
use tower::util::BoxCloneService;
use util::{config::AppConfig, state::AppState};

pub type TestApp = BoxCloneService<Request<Body>, Response, Infallible>;

fn test_config() -> AppConfig {
    AppConfig {
        env: "test".into(),
        project_name: "rollcall".into(),
        log_level: "api=info".into(),
        log_file: "api.log".into(),
        log_to_stdout: false,
        database_path: "sqlite::memory:".into(),
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "test-secret-key".into(),
        jwt_duration_minutes: 60,
        attendance_grace_minutes: 15,
        ban_threshold_percent: 20,
    }
}

/// Builds the application router on a fresh in-memory database and returns
/// it together with the connection for seeding.
pub async fn make_test_app() -> (TestApp, DatabaseConnection) {
    AppConfig::override_global(test_config());

    let db = db::test_utils::setup_test_db().await;
    let app_state = AppState::new(db.clone());

    let router: Router = Router::new().nest("/api/v1", routes(app_state));

    (router.into_service().boxed_clone(), db)
}
