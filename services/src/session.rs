use chrono::Utc;
use db::models::attendance_session::{ActiveModel, Column, Entity, SessionStatus};
use db::models::course;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};

use crate::error::AttendanceError;
use crate::token;

pub use db::models::attendance_session::Model as AttendanceSession;

/// Manages the session lifecycle for a course.
///
/// A course has at most one open session at any instant. Opening a new
/// session supersedes (closes) whichever session was still open, so the
/// lecturer's QR display always shows the single exclusively-valid token.
pub struct AttendanceSessionService;

impl AttendanceSessionService {
    /// Opens a fresh session for `course_id`, closing any session still open
    /// for that course in the same transaction.
    ///
    /// Each call produces a new session identity and a new token; repeated
    /// opens rotate the QR code rather than failing.
    pub async fn open_session(
        db: &DatabaseConnection,
        course_id: i64,
    ) -> Result<AttendanceSession, AttendanceError> {
        if course::Entity::find_by_id(course_id).one(db).await?.is_none() {
            return Err(AttendanceError::NotFound(format!(
                "Course ID {course_id} not found"
            )));
        }

        let now = Utc::now();
        let txn = db.begin().await?;

        // Supersede whatever is still open before the new session becomes
        // visible; both writes commit together or not at all.
        Entity::update_many()
            .col_expr(Column::Status, Expr::value(SessionStatus::Closed))
            .col_expr(Column::ClosedAt, Expr::value(now))
            .filter(Column::CourseId.eq(course_id))
            .filter(Column::Status.eq(SessionStatus::Open))
            .exec(&txn)
            .await?;

        let session = ActiveModel {
            course_id: Set(course_id),
            status: Set(SessionStatus::Open),
            token: Set(token::mint_token()),
            opened_at: Set(now),
            closed_at: Set(None),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(session)
    }

    /// Closes the open session for `course_id`.
    ///
    /// Fails with `NotFound` when no session is open — including a second
    /// close — signaling that the caller's view is stale.
    pub async fn close_session(
        db: &DatabaseConnection,
        course_id: i64,
    ) -> Result<AttendanceSession, AttendanceError> {
        let Some(open) = AttendanceSession::find_open_for_course(db, course_id).await? else {
            return Err(AttendanceError::NotFound(format!(
                "No open attendance session for course ID {course_id}"
            )));
        };

        let now = Utc::now();

        // Compare-and-swap on the status so a concurrent close or re-open
        // cannot close the same session twice.
        let res = Entity::update_many()
            .col_expr(Column::Status, Expr::value(SessionStatus::Closed))
            .col_expr(Column::ClosedAt, Expr::value(now))
            .filter(Column::Id.eq(open.id))
            .filter(Column::Status.eq(SessionStatus::Open))
            .exec(db)
            .await?;

        if res.rows_affected == 0 {
            return Err(AttendanceError::NotFound(format!(
                "No open attendance session for course ID {course_id}"
            )));
        }

        Ok(AttendanceSession {
            status: SessionStatus::Closed,
            closed_at: Some(now),
            ..open
        })
    }

    pub async fn get_open_session(
        db: &DatabaseConnection,
        course_id: i64,
    ) -> Result<Option<AttendanceSession>, AttendanceError> {
        Ok(AttendanceSession::find_open_for_course(db, course_id).await?)
    }
}
