use chrono::{DateTime, Duration, Utc};
use db::models::attendance_record::{ActiveModel, RecordStatus};
use db::models::{attendance_session, course_student};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set, SqlErr};
use util::config;

use crate::error::AttendanceError;

pub use db::models::attendance_record::Model as AttendanceRecord;

/// Decides whether a check-in still counts as on time.
///
/// The cut-off is measured from the session's `opened_at`. `LatePolicy::none()`
/// never downgrades.
#[derive(Debug, Clone, Copy)]
pub struct LatePolicy {
    grace: Option<Duration>,
}

impl LatePolicy {
    pub fn with_grace(grace: Duration) -> Self {
        Self { grace: Some(grace) }
    }

    pub fn none() -> Self {
        Self { grace: None }
    }

    /// Grace period from `ATTENDANCE_GRACE_MINUTES`.
    pub fn from_config() -> Self {
        Self::with_grace(Duration::minutes(config::attendance_grace_minutes()))
    }

    pub fn status_for(&self, opened_at: DateTime<Utc>, now: DateTime<Utc>) -> RecordStatus {
        match self.grace {
            Some(grace) if now - opened_at > grace => RecordStatus::Late,
            _ => RecordStatus::Present,
        }
    }
}

/// Validates a student's scan against the open session and records presence.
pub struct CheckInService;

impl CheckInService {
    /// Records attendance for `student_id` on `course_id`.
    ///
    /// "No open session", "wrong token" and "session just closed" all surface
    /// as the same `InvalidSession` error so a caller cannot distinguish the
    /// causes. The roster gate and the duplicate gate come after, in that
    /// order.
    ///
    /// The unique index on `(session_id, student_id)` closes the race left
    /// between the duplicate check and the insert: of two near-simultaneous
    /// scans exactly one creates a record, the other fails with
    /// `DuplicateCheckIn`.
    pub async fn check_in(
        db: &DatabaseConnection,
        student_id: i64,
        course_id: i64,
        submitted_token: &str,
        policy: LatePolicy,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let token = submitted_token.trim();
        if token.is_empty() {
            return Err(AttendanceError::Validation(
                "A check-in code is required".into(),
            ));
        }

        let session = attendance_session::Model::find_open_for_course(db, course_id)
            .await?
            .filter(|s| s.token == token)
            .ok_or(AttendanceError::InvalidSession)?;

        if !course_student::Model::is_enrolled(db, course_id, student_id).await? {
            return Err(AttendanceError::NotEnrolled);
        }

        if AttendanceRecord::find_for_session_and_student(db, session.id, student_id)
            .await?
            .is_some()
        {
            return Err(AttendanceError::DuplicateCheckIn);
        }

        let now = Utc::now();
        let record = ActiveModel {
            session_id: Set(session.id),
            student_id: Set(student_id),
            status: Set(policy.status_for(session.opened_at, now)),
            checked_in_at: Set(Some(now)),
            note: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        match record.insert(db).await {
            Ok(model) => Ok(model),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(AttendanceError::DuplicateCheckIn)
            }
            Err(e) => Err(e.into()),
        }
    }
}
