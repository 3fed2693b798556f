use chrono::{DateTime, Utc};
use db::models::attendance_record::{self, RecordStatus};
use db::models::attendance_session;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::Serialize;
use std::collections::HashMap;

use crate::error::AttendanceError;

pub use db::models::attendance_record::Model as AttendanceRecord;
pub use db::models::attendance_session::Model as AttendanceSession;

/// One line of a student's per-course attendance history.
///
/// Sessions the student never checked into surface as `Absent` entries
/// synthesized at read time; they are not stored.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub session_id: i64,
    pub session_date: DateTime<Utc>,
    pub check_in_time: Option<DateTime<Utc>>,
    pub status: RecordStatus,
}

/// Read-side of the durable session/record store.
pub struct AttendanceLedger;

impl AttendanceLedger {
    /// All sessions for a course, oldest first.
    pub async fn sessions_by_course(
        db: &DatabaseConnection,
        course_id: i64,
    ) -> Result<Vec<AttendanceSession>, AttendanceError> {
        Ok(attendance_session::Entity::find()
            .filter(attendance_session::Column::CourseId.eq(course_id))
            .order_by_asc(attendance_session::Column::OpenedAt)
            .order_by_asc(attendance_session::Column::Id)
            .all(db)
            .await?)
    }

    /// Stored records for a session, in scan order.
    pub async fn records_by_session(
        db: &DatabaseConnection,
        session_id: i64,
    ) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        Ok(attendance_record::Entity::find()
            .filter(attendance_record::Column::SessionId.eq(session_id))
            .order_by_asc(attendance_record::Column::CheckedInAt)
            .order_by_asc(attendance_record::Column::Id)
            .all(db)
            .await?)
    }

    /// Recorded-presence counts for a set of sessions, keyed by session id.
    pub async fn record_counts_for(
        db: &DatabaseConnection,
        session_ids: &[i64],
    ) -> Result<HashMap<i64, i64>, AttendanceError> {
        if session_ids.is_empty() {
            return Ok(HashMap::new());
        }

        #[derive(FromQueryResult)]
        struct Row {
            session_id: i64,
            cnt: i64,
        }

        let rows: Vec<Row> = attendance_record::Entity::find()
            .select_only()
            .column(attendance_record::Column::SessionId)
            .column_as(
                Expr::expr(Func::count(Expr::col(attendance_record::Column::Id))),
                "cnt",
            )
            .filter(attendance_record::Column::SessionId.is_in(session_ids.iter().cloned()))
            .group_by(attendance_record::Column::SessionId)
            .into_model::<Row>()
            .all(db)
            .await?;

        Ok(rows.into_iter().map(|r| (r.session_id, r.cnt)).collect())
    }

    /// A student's outcome for every session the course has ever had,
    /// chronological: exactly one entry per session, `Absent` where no
    /// record exists.
    pub async fn history(
        db: &DatabaseConnection,
        student_id: i64,
        course_id: i64,
    ) -> Result<Vec<HistoryEntry>, AttendanceError> {
        let sessions = Self::sessions_by_course(db, course_id).await?;
        if sessions.is_empty() {
            return Ok(Vec::new());
        }

        let session_ids: Vec<i64> = sessions.iter().map(|s| s.id).collect();
        let records = attendance_record::Entity::find()
            .filter(attendance_record::Column::StudentId.eq(student_id))
            .filter(attendance_record::Column::SessionId.is_in(session_ids))
            .all(db)
            .await?;
        let by_session: HashMap<i64, AttendanceRecord> =
            records.into_iter().map(|r| (r.session_id, r)).collect();

        Ok(sessions
            .into_iter()
            .map(|s| match by_session.get(&s.id) {
                Some(r) => HistoryEntry {
                    session_id: s.id,
                    session_date: s.opened_at,
                    check_in_time: r.checked_in_at,
                    status: r.status,
                },
                None => HistoryEntry {
                    session_id: s.id,
                    session_date: s.opened_at,
                    check_in_time: None,
                    status: RecordStatus::Absent,
                },
            })
            .collect())
    }

    /// Lecturer correction of a recorded outcome — the only mutation a
    /// record permits after creation.
    pub async fn override_record(
        db: &DatabaseConnection,
        record_id: i64,
        status: RecordStatus,
        note: Option<String>,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let Some(record) = attendance_record::Entity::find_by_id(record_id).one(db).await? else {
            return Err(AttendanceError::NotFound(format!(
                "Attendance record ID {record_id} not found"
            )));
        };

        let mut active: attendance_record::ActiveModel = record.into();
        active.status = Set(status);
        if let Some(note) = note {
            active.note = Set(Some(note));
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(db).await?)
    }
}
