//! In-memory implementation of the attendance stores.
//!
//! One [`MemoryStore`] holds students, classes, session codes and the
//! ledger behind a single async mutex, which makes the conditional ledger
//! append atomic. Clones share the same state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::error::DatabaseResult;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::{AttendanceRecord, ClassInfo, SessionCode, Student};
use crate::store::{
    AppendOutcome, LedgerFilter, LedgerStore, RosterStore, SessionFilter, SessionRegistryStore,
};

#[derive(Debug, Default)]
struct Inner {
    students: Vec<Student>,
    classes: Vec<ClassInfo>,
    sessions: Vec<SessionCode>,
    records: Vec<AttendanceRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an approved student
    pub async fn add_student(&self, student: Student) {
        let mut inner = self.inner.lock().await;
        inner.students.retain(|s| s.roll_no != student.roll_no);
        inner.students.push(student);
    }

    pub async fn add_class(&self, class: ClassInfo) {
        self.inner.lock().await.classes.push(class);
    }

    /// Snapshot of the whole ledger
    pub async fn records(&self) -> Vec<AttendanceRecord> {
        self.inner.lock().await.records.clone()
    }
}

impl RosterStore for MemoryStore {
    async fn find_approved_student(&self, student_id: &str) -> DatabaseResult<Option<Student>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .students
            .iter()
            .find(|s| s.roll_no == student_id)
            .cloned())
    }

    async fn find_class(&self, class_id: Uuid) -> DatabaseResult<Option<ClassInfo>> {
        let inner = self.inner.lock().await;
        Ok(inner.classes.iter().find(|c| c.id == class_id).cloned())
    }

    async fn find_class_roster(&self, class: &ClassInfo) -> DatabaseResult<Vec<Student>> {
        let inner = self.inner.lock().await;
        let mut roster: Vec<Student> = inner
            .students
            .iter()
            .filter(|s| {
                s.course == class.course
                    && s.branch == class.branch
                    && s.section == class.section
                    && s.semester == class.semester
            })
            .cloned()
            .collect();
        roster.sort_by(|a, b| a.roll_no.cmp(&b.roll_no));
        Ok(roster)
    }
}

impl SessionRegistryStore for MemoryStore {
    async fn insert(&self, session: &SessionCode) -> DatabaseResult<bool> {
        let mut inner = self.inner.lock().await;
        if inner.sessions.iter().any(|s| s.code == session.code) {
            return Ok(false);
        }
        inner.sessions.push(session.clone());
        Ok(true)
    }

    async fn find_by_code(&self, code: &str) -> DatabaseResult<Option<SessionCode>> {
        let inner = self.inner.lock().await;
        Ok(inner.sessions.iter().find(|s| s.code == code).cloned())
    }

    async fn find(&self, filter: &SessionFilter) -> DatabaseResult<Vec<SessionCode>> {
        let inner = self.inner.lock().await;
        let mut sessions: Vec<SessionCode> = inner
            .sessions
            .iter()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();
        sessions.sort_by_key(|s| s.start_time);
        Ok(sessions)
    }

    async fn count_matching(&self, filter: &SessionFilter) -> DatabaseResult<u64> {
        let inner = self.inner.lock().await;
        Ok(inner.sessions.iter().filter(|s| filter.matches(s)).count() as u64)
    }
}

impl LedgerStore for MemoryStore {
    async fn exists(&self, student_id: &str, session_code: &str) -> DatabaseResult<bool> {
        let inner = self.inner.lock().await;
        Ok(inner
            .records
            .iter()
            .any(|r| r.student_id == student_id && r.session_code == session_code))
    }

    async fn find_recent_by_device(
        &self,
        device_fingerprint: &str,
        since: DateTime<Utc>,
    ) -> DatabaseResult<Vec<AttendanceRecord>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .records
            .iter()
            .filter(|r| r.device_fingerprint == device_fingerprint && r.marked_at >= since)
            .cloned()
            .collect())
    }

    async fn append(
        &self,
        record: &AttendanceRecord,
        device_window_start: DateTime<Utc>,
    ) -> DatabaseResult<AppendOutcome> {
        let mut inner = self.inner.lock().await;

        if inner
            .records
            .iter()
            .any(|r| r.student_id == record.student_id && r.session_code == record.session_code)
        {
            return Ok(AppendOutcome::AlreadyMarked);
        }

        if inner.records.iter().any(|r| {
            r.device_fingerprint == record.device_fingerprint && r.marked_at >= device_window_start
        }) {
            return Ok(AppendOutcome::DeviceReused);
        }

        inner.records.push(record.clone());
        Ok(AppendOutcome::Inserted)
    }

    async fn find(&self, filter: &LedgerFilter) -> DatabaseResult<Vec<AttendanceRecord>> {
        let inner = self.inner.lock().await;
        let mut records: Vec<AttendanceRecord> = inner
            .records
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        records.sort_by_key(|r| r.marked_at);
        Ok(records)
    }

    async fn count_matching(&self, filter: &LedgerFilter) -> DatabaseResult<u64> {
        let inner = self.inner.lock().await;
        Ok(inner.records.iter().filter(|r| filter.matches(r)).count() as u64)
    }
}
