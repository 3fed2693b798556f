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
    student: UserModel,
    outsider: UserModel,
    course: CourseModel,
}

async fn setup(db: &sea_orm::DatabaseConnection) -> TestCtx {
    let lecturer = UserModel::create(db, "lect1", "lect1@test.com", "Lecturer One", "password", false)
        .await
        .unwrap();
    let student = UserModel::create(db, "21520001", "st1@test.com", "Student One", "password", false)
        .await
        .unwrap();
    let outsider = UserModel::create(db, "21529999", "out@test.com", "Outsider", "password", false)
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
        student,
        outsider,
        course,
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
async fn history_returns_one_entry_per_session_with_synthesized_absences() {
    let (app, db) = make_test_app().await;
    let ctx = setup(&db).await;

    // Three sessions, attendance in only the second.
    AttendanceSessionService::open_session(&db, ctx.course.id)
        .await
        .unwrap();
    let s2 = AttendanceSessionService::open_session(&db, ctx.course.id)
        .await
        .unwrap();
    CheckInService::check_in(&db, ctx.student.id, ctx.course.id, &s2.token, LatePolicy::none())
        .await
        .unwrap();
    AttendanceSessionService::open_session(&db, ctx.course.id)
        .await
        .unwrap();

    let (token, _) = generate_jwt(ctx.student.id, false);
    let res = get(
        &app,
        &format!("/api/v1/attendance/history/{}", ctx.course.id),
        &token,
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    let body = json_body(res).await;
    let entries = body["data"].as_array().unwrap();
    assert_eq!(entries.len(), 3);

    let absents = entries
        .iter()
        .filter(|e| e["status"] == "ABSENT")
        .count();
    assert_eq!(absents, 2);
    for e in entries.iter().filter(|e| e["status"] == "ABSENT") {
        assert!(e["check_in_time"].is_null());
    }
}

#[tokio::test]
async fn history_is_forbidden_for_unenrolled_users() {
    let (app, db) = make_test_app().await;
    let ctx = setup(&db).await;

    let (token, _) = generate_jwt(ctx.outsider.id, false);
    let res = get(
        &app,
        &format!("/api/v1/attendance/history/{}", ctx.course.id),
        &token,
    )
    .await;

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn lecturer_lists_sessions_with_presence_counts() {
    let (app, db) = make_test_app().await;
    let ctx = setup(&db).await;

    let s1 = AttendanceSessionService::open_session(&db, ctx.course.id)
        .await
        .unwrap();
    CheckInService::check_in(&db, ctx.student.id, ctx.course.id, &s1.token, LatePolicy::none())
        .await
        .unwrap();
    AttendanceSessionService::open_session(&db, ctx.course.id)
        .await
        .unwrap();

    let (token, _) = generate_jwt(ctx.lecturer.id, false);
    let res = get(
        &app,
        &format!("/api/v1/attendance/course/{}", ctx.course.id),
        &token,
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    let body = json_body(res).await;
    let sessions = body["data"].as_array().unwrap();
    assert_eq!(sessions.len(), 2);
    // Oldest first; the first session has the one check-in.
    assert_eq!(sessions[0]["id"], s1.id);
    assert_eq!(sessions[0]["attended_count"], 1);
    assert_eq!(sessions[1]["attended_count"], 0);
    assert!(sessions[0].get("qr_code_data").is_none());
}

#[tokio::test]
async fn students_cannot_list_course_sessions() {
    let (app, db) = make_test_app().await;
    let ctx = setup(&db).await;

    let (token, _) = generate_jwt(ctx.student.id, false);
    let res = get(
        &app,
        &format!("/api/v1/attendance/course/{}", ctx.course.id),
        &token,
    )
    .await;

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn session_records_resolve_student_identity() {
    let (app, db) = make_test_app().await;
    let ctx = setup(&db).await;

    let session = AttendanceSessionService::open_session(&db, ctx.course.id)
        .await
        .unwrap();
    CheckInService::check_in(
        &db,
        ctx.student.id,
        ctx.course.id,
        &session.token,
        LatePolicy::none(),
    )
    .await
    .unwrap();

    let (token, _) = generate_jwt(ctx.lecturer.id, false);
    let res = get(
        &app,
        &format!("/api/v1/attendance/session/{}/records", session.id),
        &token,
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    let body = json_body(res).await;
    let records = body["data"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["student_code"], "21520001");
    assert_eq!(records[0]["full_name"], "Student One");
    assert_eq!(records[0]["status"], "PRESENT");
}

#[tokio::test]
async fn records_for_unknown_session_are_not_found() {
    let (app, db) = make_test_app().await;
    let ctx = setup(&db).await;

    let (token, _) = generate_jwt(ctx.lecturer.id, false);
    let res = get(&app, "/api/v1/attendance/session/4242/records", &token).await;

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
