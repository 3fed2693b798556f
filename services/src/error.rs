use sea_orm::DbErr;
use thiserror::Error;

/// Error kinds surfaced by the attendance services.
///
/// Every kind is terminal for the operation that raised it; nothing is
/// retried internally and no partial state is left behind.
#[derive(Debug, Error)]
pub enum AttendanceError {
    /// Referenced course, session, or record does not exist or is not in the
    /// expected state (e.g., closing a course with no open session).
    #[error("{0}")]
    NotFound(String),

    /// Submitted token does not match any currently open session. One
    /// message for both "no session" and "wrong token" so callers cannot
    /// probe for session existence.
    #[error("Check-in window closed or code invalid")]
    InvalidSession,

    /// Student is not on the course roster.
    #[error("Student is not enrolled in this course")]
    NotEnrolled,

    /// Student already has a record for this session.
    #[error("Attendance already recorded")]
    DuplicateCheckIn,

    /// Missing or malformed identifiers on a call.
    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Db(#[from] DbErr),
}
