//! Attendance domain models

pub mod class;
pub mod record;
pub mod session_code;
pub mod student;

// Re-export for convenience
pub use class::{ClassInfo, NewClass};
pub use record::{AttendanceRecord, MarkRequest};
pub use session_code::{IssueSessionCode, SessionCode};
pub use student::Student;

/// Canonical form of a free-text subject name: trimmed and lower-cased.
///
/// Subjects are normalized before they are stored or compared, so matching
/// is plain string equality.
pub fn normalize_subject(subject: &str) -> String {
    subject.trim().to_lowercase()
}

/// Canonical form of roll numbers and employee ids
pub fn normalize_id(id: &str) -> String {
    id.trim().to_uppercase()
}
