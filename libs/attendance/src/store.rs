//! Store trait definitions the attendance core reads from and appends to.
//!
//! All store operations are async and return [`DatabaseResult`]. Subject
//! criteria in the filters are expected in normalized form (see
//! [`normalize_subject`](crate::models::normalize_subject)).

use chrono::{DateTime, Utc};
use common::error::DatabaseResult;
use uuid::Uuid;

use crate::models::{AttendanceRecord, ClassInfo, SessionCode, Student};
use crate::time::TimeRange;

/// Criteria for selecting session codes. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionFilter {
    pub teacher_id: Option<String>,
    pub subjects: Option<Vec<String>>,
    /// `start_time` must fall inside this range
    pub started_within: Option<TimeRange>,
    /// `end_time` must be strictly after this instant
    pub ends_after: Option<DateTime<Utc>>,
}

impl SessionFilter {
    pub fn matches(&self, session: &SessionCode) -> bool {
        self.teacher_id
            .as_ref()
            .is_none_or(|teacher| &session.teacher_id == teacher)
            && self
                .subjects
                .as_ref()
                .is_none_or(|subjects| subjects.contains(&session.subject))
            && self
                .started_within
                .is_none_or(|range| range.contains(session.start_time))
            && self.ends_after.is_none_or(|after| session.end_time > after)
    }
}

/// Criteria for selecting ledger entries. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerFilter {
    pub student_id: Option<String>,
    pub subjects: Option<Vec<String>>,
    pub session_codes: Option<Vec<String>>,
    /// `marked_at` must fall inside this range
    pub marked_within: Option<TimeRange>,
}

impl LedgerFilter {
    pub fn matches(&self, record: &AttendanceRecord) -> bool {
        self.student_id
            .as_ref()
            .is_none_or(|student| &record.student_id == student)
            && self
                .subjects
                .as_ref()
                .is_none_or(|subjects| subjects.contains(&record.subject))
            && self
                .session_codes
                .as_ref()
                .is_none_or(|codes| codes.contains(&record.session_code))
            && self
                .marked_within
                .is_none_or(|range| range.contains(record.marked_at))
    }
}

/// Result of a conditional ledger append
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Inserted,
    /// A record for the same student and session code already exists
    AlreadyMarked,
    /// The device marked at or after the window start
    DeviceReused,
}

/// Approved students and the classes they belong to
pub trait RosterStore: Send + Sync {
    fn find_approved_student(
        &self,
        student_id: &str,
    ) -> impl Future<Output = DatabaseResult<Option<Student>>> + Send;

    fn find_class(
        &self,
        class_id: Uuid,
    ) -> impl Future<Output = DatabaseResult<Option<ClassInfo>>> + Send;

    /// Approved students sharing the class's course, branch, section and
    /// semester, sorted by roll number
    fn find_class_roster(
        &self,
        class: &ClassInfo,
    ) -> impl Future<Output = DatabaseResult<Vec<Student>>> + Send;
}

/// Issued session codes
pub trait SessionRegistryStore: Send + Sync {
    /// Returns `false` without writing when the code is already taken.
    fn insert(&self, session: &SessionCode) -> impl Future<Output = DatabaseResult<bool>> + Send;

    fn find_by_code(
        &self,
        code: &str,
    ) -> impl Future<Output = DatabaseResult<Option<SessionCode>>> + Send;

    /// Matching codes ordered by `start_time` ascending
    fn find(
        &self,
        filter: &SessionFilter,
    ) -> impl Future<Output = DatabaseResult<Vec<SessionCode>>> + Send;

    fn count_matching(
        &self,
        filter: &SessionFilter,
    ) -> impl Future<Output = DatabaseResult<u64>> + Send;
}

/// Append-only attendance ledger
pub trait LedgerStore: Send + Sync {
    fn exists(
        &self,
        student_id: &str,
        session_code: &str,
    ) -> impl Future<Output = DatabaseResult<bool>> + Send;

    fn find_recent_by_device(
        &self,
        device_fingerprint: &str,
        since: DateTime<Utc>,
    ) -> impl Future<Output = DatabaseResult<Vec<AttendanceRecord>>> + Send;

    /// Atomically appends `record` unless the student already marked this
    /// session code or the device has a record at or after
    /// `device_window_start`.
    fn append(
        &self,
        record: &AttendanceRecord,
        device_window_start: DateTime<Utc>,
    ) -> impl Future<Output = DatabaseResult<AppendOutcome>> + Send;

    /// Matching records ordered by `marked_at` ascending
    fn find(
        &self,
        filter: &LedgerFilter,
    ) -> impl Future<Output = DatabaseResult<Vec<AttendanceRecord>>> + Send;

    fn count_matching(
        &self,
        filter: &LedgerFilter,
    ) -> impl Future<Output = DatabaseResult<u64>> + Send;
}

/// Subjects studied per program, branch and semester
pub trait CurriculumCatalog: Send + Sync {
    /// Subject names in curriculum order, or `None` when undefined
    fn subjects_for(&self, program: &str, branch: &str, semester: i32) -> Option<Vec<String>>;
}
