use async_trait::async_trait;

use crate::error::AttendanceError;
use crate::statistics::StudentCourseStatistics;

pub use db::models::course::Model as Course;

/// Delivery seam for "exam eligibility lost" notifications.
///
/// Real delivery (email, push) is an external collaborator; the engine only
/// hands over the banned slice of a course's statistics.
#[async_trait]
pub trait BanNotifier: Send + Sync {
    /// Returns how many notifications were handed to the transport.
    async fn notify_banned(
        &self,
        course: &Course,
        banned: &[StudentCourseStatistics],
    ) -> Result<u32, AttendanceError>;
}

/// Notifier that only logs. Stands in wherever no transport is configured.
pub struct TracingBanNotifier;

#[async_trait]
impl BanNotifier for TracingBanNotifier {
    async fn notify_banned(
        &self,
        course: &Course,
        banned: &[StudentCourseStatistics],
    ) -> Result<u32, AttendanceError> {
        for s in banned {
            tracing::info!(
                course = %course.code,
                student = %s.student_code,
                absent_percentage = s.absent_percentage,
                "ban notification queued"
            );
        }
        Ok(banned.len() as u32)
    }
}

/// Turns a course's statistics array into a downloadable report.
pub trait ReportExporter: Send + Sync {
    fn content_type(&self) -> &'static str;
    fn file_name(&self, course: &Course) -> String;
    fn export(
        &self,
        course: &Course,
        stats: &[StudentCourseStatistics],
    ) -> Result<Vec<u8>, AttendanceError>;
}

/// Plain CSV report, one row per enrolled student.
pub struct CsvReportExporter;

impl ReportExporter for CsvReportExporter {
    fn content_type(&self) -> &'static str {
        "text/csv; charset=utf-8"
    }

    fn file_name(&self, course: &Course) -> String {
        format!("attendance_{}.csv", course.code.replace('/', "_"))
    }

    fn export(
        &self,
        _course: &Course,
        stats: &[StudentCourseStatistics],
    ) -> Result<Vec<u8>, AttendanceError> {
        fn esc(s: &str) -> String {
            if s.contains(',') || s.contains('"') || s.contains('\n') {
                format!("\"{}\"", s.replace('"', "\"\""))
            } else {
                s.to_string()
            }
        }

        let mut csv = String::from(
            "student_code,full_name,total_sessions,present,late,excused,absent,absent_percentage,is_banned\n",
        );
        for s in stats {
            let row = format!(
                "{},{},{},{},{},{},{},{},{}\n",
                esc(&s.student_code),
                esc(&s.full_name),
                s.total_sessions,
                s.present_sessions,
                s.late_sessions,
                s.excused_sessions,
                s.absent_sessions,
                s.absent_percentage,
                s.is_banned
            );
            csv.push_str(&row);
        }

        Ok(csv.into_bytes())
    }
}
