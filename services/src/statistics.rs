use db::models::attendance_record::{self, RecordStatus};
use db::models::{course_student, user};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Serialize;
use std::collections::HashMap;
use util::config;

use crate::error::AttendanceError;
use crate::ledger::AttendanceLedger;

/// Absence share (inclusive) at which a student loses exam eligibility.
/// `BAN_THRESHOLD_PERCENT` in the environment overrides it at runtime.
pub const DEFAULT_BAN_THRESHOLD_PERCENT: u32 = 20;

/// Attendance totals for one student on one course. Derived from the ledger
/// on demand, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct StudentCourseStatistics {
    pub student_id: i64,
    pub student_code: String,
    pub full_name: String,
    pub total_sessions: u32,
    pub present_sessions: u32,
    pub late_sessions: u32,
    pub excused_sessions: u32,
    pub absent_sessions: u32,
    pub absent_percentage: u32,
    pub is_banned: bool,
}

/// Folds the ledger into per-student statistics and the ban determination.
pub struct StatisticsService;

impl StatisticsService {
    /// Statistics for every enrolled student, in roster (enrollment) order,
    /// using the configured ban threshold.
    pub async fn evaluate(
        db: &DatabaseConnection,
        course_id: i64,
    ) -> Result<Vec<StudentCourseStatistics>, AttendanceError> {
        Self::evaluate_with_threshold(db, course_id, config::ban_threshold_percent()).await
    }

    /// A session counts against a student unless a PRESENT, LATE, or EXCUSED
    /// record exists for it — recordless sessions and explicit ABSENT
    /// records alike. `absent_percentage` is 0 for a course with no
    /// sessions, never a division error.
    pub async fn evaluate_with_threshold(
        db: &DatabaseConnection,
        course_id: i64,
        ban_threshold_percent: u32,
    ) -> Result<Vec<StudentCourseStatistics>, AttendanceError> {
        let roster = course_student::Model::roster(db, course_id).await?;
        if roster.is_empty() {
            return Ok(Vec::new());
        }

        let sessions = AttendanceLedger::sessions_by_course(db, course_id).await?;
        let total_sessions = sessions.len() as u32;
        let session_ids: Vec<i64> = sessions.iter().map(|s| s.id).collect();

        let student_ids: Vec<i64> = roster.iter().map(|e| e.student_id).collect();
        let students: HashMap<i64, user::Model> = user::Entity::find()
            .filter(user::Column::Id.is_in(student_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let mut statuses_by_student: HashMap<i64, Vec<RecordStatus>> = HashMap::new();
        if !session_ids.is_empty() {
            let records = attendance_record::Entity::find()
                .filter(attendance_record::Column::SessionId.is_in(session_ids))
                .all(db)
                .await?;
            for r in records {
                statuses_by_student
                    .entry(r.student_id)
                    .or_default()
                    .push(r.status);
            }
        }

        let mut out = Vec::with_capacity(roster.len());
        for enrollment in roster {
            let statuses = statuses_by_student
                .remove(&enrollment.student_id)
                .unwrap_or_default();

            let count = |wanted: RecordStatus| {
                statuses.iter().filter(|s| **s == wanted).count() as u32
            };
            let present_sessions = count(RecordStatus::Present);
            let late_sessions = count(RecordStatus::Late);
            let excused_sessions = count(RecordStatus::Excused);

            let attended = statuses.iter().filter(|s| s.counts_as_attended()).count() as u32;
            let absent_sessions = total_sessions.saturating_sub(attended);
            let absent_percentage = if total_sessions == 0 {
                0
            } else {
                ((absent_sessions as f64 / total_sessions as f64) * 100.0).round() as u32
            };

            let student = students.get(&enrollment.student_id);
            out.push(StudentCourseStatistics {
                student_id: enrollment.student_id,
                student_code: student.map(|u| u.username.clone()).unwrap_or_default(),
                full_name: student.map(|u| u.full_name.clone()).unwrap_or_default(),
                total_sessions,
                present_sessions,
                late_sessions,
                excused_sessions,
                absent_sessions,
                absent_percentage,
                is_banned: absent_percentage >= ban_threshold_percent,
            });
        }

        Ok(out)
    }
}
