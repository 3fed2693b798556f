#![allow(clippy::unwrap_used)]

use api::auth::generate_jwt;
use axum::{
    body::{Body as AxumBody, to_bytes},
    http::{Request, StatusCode},
    response::Response,
};
use serde_json::{Value, json};
use tower::ServiceExt;

use db::models::{course::Model as CourseModel, course_student, user::Model as UserModel};

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
        .expect("create lecturer");
    let student = UserModel::create(db, "21520001", "st1@test.com", "Student One", "password", false)
        .await
        .expect("create student");
    let outsider = UserModel::create(db, "21529999", "out@test.com", "Outsider", "password", false)
        .await
        .expect("create outsider");

    let course = CourseModel::create(db, "SE401.P12", "Software Engineering", lecturer.id)
        .await
        .expect("create course");
    course_student::Model::enroll(db, course.id, student.id)
        .await
        .expect("enroll student");

    TestCtx {
        lecturer,
        student,
        outsider,
        course,
    }
}

async fn post_json(app: &TestApp, uri: &str, token: &str, body: Value) -> Response {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .header("Content-Type", "application/json")
        .body(AxumBody::from(body.to_string()))
        .unwrap();
    app.clone().oneshot(req).await.unwrap()
}

async fn json_body(res: Response) -> Value {
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn open_session(app: &TestApp, ctx: &TestCtx) -> Value {
    let (token, _) = generate_jwt(ctx.lecturer.id, false);
    let res = post_json(
        app,
        "/api/v1/attendance/start-session",
        &token,
        json!({ "course_id": ctx.course.id }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    json_body(res).await
}

#[tokio::test]
async fn lecturer_can_open_a_session() {
    let (app, db) = make_test_app().await;
    let ctx = setup(&db).await;

    let body = open_session(&app, &ctx).await;

    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["course_id"], ctx.course.id);
    assert_eq!(body["data"]["status"], "OPEN");
    assert!(
        !body["data"]["qr_code_data"].as_str().unwrap().is_empty(),
        "open session must carry a QR payload"
    );
}

#[tokio::test]
async fn student_cannot_open_a_session() {
    let (app, db) = make_test_app().await;
    let ctx = setup(&db).await;

    let (token, _) = generate_jwt(ctx.student.id, false);
    let res = post_json(
        &app,
        "/api/v1/attendance/start-session",
        &token,
        json!({ "course_id": ctx.course.id }),
    )
    .await;

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn opening_for_unknown_course_is_not_found() {
    let (app, db) = make_test_app().await;
    let ctx = setup(&db).await;

    let (token, _) = generate_jwt(ctx.lecturer.id, false);
    let res = post_json(
        &app,
        "/api/v1/attendance/start-session",
        &token,
        json!({ "course_id": 424242 }),
    )
    .await;

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reopening_rotates_the_token_and_invalidates_the_old_one() {
    let (app, db) = make_test_app().await;
    let ctx = setup(&db).await;

    let first = open_session(&app, &ctx).await;
    let second = open_session(&app, &ctx).await;

    let old_token = first["data"]["qr_code_data"].as_str().unwrap();
    let new_token = second["data"]["qr_code_data"].as_str().unwrap();
    assert_ne!(old_token, new_token);

    // The superseded token no longer checks in.
    let (student_jwt, _) = generate_jwt(ctx.student.id, false);
    let res = post_json(
        &app,
        "/api/v1/attendance/check-in",
        &student_jwt,
        json!({ "course_id": ctx.course.id, "qr_code_data": old_token }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // The fresh one does.
    let res = post_json(
        &app,
        "/api/v1/attendance/check-in",
        &student_jwt,
        json!({ "course_id": ctx.course.id, "qr_code_data": new_token }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn close_session_then_double_close_is_stale() {
    let (app, db) = make_test_app().await;
    let ctx = setup(&db).await;
    open_session(&app, &ctx).await;

    let (token, _) = generate_jwt(ctx.lecturer.id, false);
    let res = post_json(
        &app,
        "/api/v1/attendance/close-session",
        &token,
        json!({ "course_id": ctx.course.id }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["data"]["status"], "CLOSED");

    let res = post_json(
        &app,
        "/api/v1/attendance/close-session",
        &token,
        json!({ "course_id": ctx.course.id }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn check_in_records_presence() {
    let (app, db) = make_test_app().await;
    let ctx = setup(&db).await;
    let session = open_session(&app, &ctx).await;
    let qr = session["data"]["qr_code_data"].as_str().unwrap();

    let (token, _) = generate_jwt(ctx.student.id, false);
    let res = post_json(
        &app,
        "/api/v1/attendance/check-in",
        &token,
        json!({ "course_id": ctx.course.id, "qr_code_data": qr }),
    )
    .await;

    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["data"]["status"], "PRESENT");
    assert!(body["data"]["check_in_time"].is_string());
}

#[tokio::test]
async fn check_in_after_close_is_rejected_with_generic_message() {
    let (app, db) = make_test_app().await;
    let ctx = setup(&db).await;
    let session = open_session(&app, &ctx).await;
    let qr = session["data"]["qr_code_data"].as_str().unwrap().to_string();

    let (lect_jwt, _) = generate_jwt(ctx.lecturer.id, false);
    post_json(
        &app,
        "/api/v1/attendance/close-session",
        &lect_jwt,
        json!({ "course_id": ctx.course.id }),
    )
    .await;

    let (token, _) = generate_jwt(ctx.student.id, false);
    let res = post_json(
        &app,
        "/api/v1/attendance/check-in",
        &token,
        json!({ "course_id": ctx.course.id, "qr_code_data": qr }),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = json_body(res).await;
    assert_eq!(body["message"], "Check-in window closed or code invalid");
}

#[tokio::test]
async fn wrong_code_gets_the_same_message_as_no_session() {
    let (app, db) = make_test_app().await;
    let ctx = setup(&db).await;
    let (token, _) = generate_jwt(ctx.student.id, false);

    // No session open at all.
    let res = post_json(
        &app,
        "/api/v1/attendance/check-in",
        &token,
        json!({ "course_id": ctx.course.id, "qr_code_data": "bogus" }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let no_session = json_body(res).await;

    open_session(&app, &ctx).await;
    let res = post_json(
        &app,
        "/api/v1/attendance/check-in",
        &token,
        json!({ "course_id": ctx.course.id, "qr_code_data": "bogus" }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let wrong_code = json_body(res).await;

    assert_eq!(no_session["message"], wrong_code["message"]);
}

#[tokio::test]
async fn duplicate_check_in_conflicts() {
    let (app, db) = make_test_app().await;
    let ctx = setup(&db).await;
    let session = open_session(&app, &ctx).await;
    let qr = session["data"]["qr_code_data"].as_str().unwrap().to_string();

    let (token, _) = generate_jwt(ctx.student.id, false);
    let first = post_json(
        &app,
        "/api/v1/attendance/check-in",
        &token,
        json!({ "course_id": ctx.course.id, "qr_code_data": qr }),
    )
    .await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = post_json(
        &app,
        "/api/v1/attendance/check-in",
        &token,
        json!({ "course_id": ctx.course.id, "qr_code_data": qr }),
    )
    .await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let body = json_body(second).await;
    assert_eq!(body["message"], "Attendance already recorded");
}

#[tokio::test]
async fn unenrolled_student_cannot_check_in() {
    let (app, db) = make_test_app().await;
    let ctx = setup(&db).await;
    let session = open_session(&app, &ctx).await;
    let qr = session["data"]["qr_code_data"].as_str().unwrap().to_string();

    let (token, _) = generate_jwt(ctx.outsider.id, false);
    let res = post_json(
        &app,
        "/api/v1/attendance/check-in",
        &token,
        json!({ "course_id": ctx.course.id, "qr_code_data": qr }),
    )
    .await;

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn blank_code_is_a_validation_error() {
    let (app, db) = make_test_app().await;
    let ctx = setup(&db).await;
    open_session(&app, &ctx).await;

    let (token, _) = generate_jwt(ctx.student.id, false);
    let res = post_json(
        &app,
        "/api/v1/attendance/check-in",
        &token,
        json!({ "course_id": ctx.course.id, "qr_code_data": "" }),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let (app, db) = make_test_app().await;
    let ctx = setup(&db).await;

    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/attendance/start-session")
        .header("Content-Type", "application/json")
        .body(AxumBody::from(
            json!({ "course_id": ctx.course.id }).to_string(),
        ))
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}
