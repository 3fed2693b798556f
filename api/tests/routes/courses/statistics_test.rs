#![allow(clippy::unwrap_used)]

use api::auth::generate_jwt;
use axum::{
    body::{Body as AxumBody, to_bytes},
    http::{Request, StatusCode},
    response::Response,
};
use serde_json::Value;
use tower::ServiceExt;

use db::models::{course::Model as CourseModel, course_student, user::Model as UserModel};
use services::check_in::{CheckInService, LatePolicy};
use services::session::AttendanceSessionService;

use crate::helpers::app::{TestApp, make_test_app};

struct TestCtx {
    lecturer: UserModel,
    other_lecturer: UserModel,
    student: UserModel,
    course: CourseModel,
}

async fn setup(db: &sea_orm::DatabaseConnection) -> TestCtx {
    let lecturer = UserModel::create(db, "lect1", "lect1@test.com", "Lecturer One", "password", false)
        .await
        .unwrap();
    let other_lecturer =
        UserModel::create(db, "lect2", "lect2@test.com", "Lecturer Two", "password", false)
            .await
            .unwrap();
    let student = UserModel::create(db, "21520001", "st1@test.com", "Student One", "password", false)
        .await
        .unwrap();
    let course = CourseModel::create(db, "SE401.P12", "Software Engineering", lecturer.id)
        .await
        .unwrap();
    course_student::Model::enroll(db, course.id, student.id)
        .await
        .unwrap();

    TestCtx {
        lecturer,
        other_lecturer,
        student,
        course,
    }
}

/// Three sessions with one miss for the seeded student.
async fn run_three_sessions(db: &sea_orm::DatabaseConnection, ctx: &TestCtx) {
    for attended in [true, true, false] {
        let session = AttendanceSessionService::open_session(db, ctx.course.id)
            .await
            .unwrap();
        if attended {
            CheckInService::check_in(db, ctx.student.id, ctx.course.id, &session.token, LatePolicy::none())
                .await
                .unwrap();
        }
    }
}

async fn get(app: &TestApp, uri: &str, token: &str) -> Response {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .body(AxumBody::empty())
        .unwrap();
    app.clone().oneshot(req).await.unwrap()
}

async fn json_body(res: Response) -> Value {
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn statistics_report_absence_rate_and_ban() {
    let (app, db) = make_test_app().await;
    let ctx = setup(&db).await;
    run_three_sessions(&db, &ctx).await;

    let (token, _) = generate_jwt(ctx.lecturer.id, false);
    let res = get(
        &app,
        &format!("/api/v1/courses/{}/statistics", ctx.course.id),
        &token,
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    let body = json_body(res).await;
    let stats = body["data"].as_array().unwrap();
    assert_eq!(stats.len(), 1);

    let s = &stats[0];
    assert_eq!(s["student_code"], "21520001");
    assert_eq!(s["full_name"], "Student One");
    assert_eq!(s["total_sessions"], 3);
    assert_eq!(s["absent_sessions"], 1);
    assert_eq!(s["absent_percentage"], 33);
    assert_eq!(s["is_banned"], true);
}

#[tokio::test]
async fn statistics_are_scoped_to_the_owning_lecturer() {
    let (app, db) = make_test_app().await;
    let ctx = setup(&db).await;

    let (token, _) = generate_jwt(ctx.other_lecturer.id, false);
    let res = get(
        &app,
        &format!("/api/v1/courses/{}/statistics", ctx.course.id),
        &token,
    )
    .await;

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn statistics_for_unknown_course_are_not_found() {
    let (app, db) = make_test_app().await;
    let ctx = setup(&db).await;

    let (token, _) = generate_jwt(ctx.lecturer.id, false);
    let res = get(&app, "/api/v1/courses/424242/statistics", &token).await;

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn export_returns_a_csv_attachment() {
    let (app, db) = make_test_app().await;
    let ctx = setup(&db).await;
    run_three_sessions(&db, &ctx).await;

    let (token, _) = generate_jwt(ctx.lecturer.id, false);
    let res = get(
        &app,
        &format!("/api/v1/courses/{}/export", ctx.course.id),
        &token,
    )
    .await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers().get("content-type").unwrap(),
        "text/csv; charset=utf-8"
    );
    assert!(
        res.headers()
            .get("content-disposition")
            .unwrap()
            .to_str()
            .unwrap()
            .contains("attachment")
    );

    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let csv = String::from_utf8(bytes.to_vec()).unwrap();
    let mut lines = csv.lines();
    assert!(lines.next().unwrap().starts_with("student_code,"));
    assert!(lines.next().unwrap().starts_with("21520001,"));
}

#[tokio::test]
async fn ban_notifications_report_the_banned_count() {
    let (app, db) = make_test_app().await;
    let ctx = setup(&db).await;
    run_three_sessions(&db, &ctx).await;

    let (token, _) = generate_jwt(ctx.lecturer.id, false);
    let req = Request::builder()
        .method("POST")
        .uri(format!(
            "/api/v1/courses/{}/send-ban-notifications",
            ctx.course.id
        ))
        .header("Authorization", format!("Bearer {token}"))
        .body(AxumBody::empty())
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["data"]["banned_students"], 1);
    assert_eq!(body["data"]["notified"], 1);
}
