//! Shared fixtures for the attendance integration tests

#![allow(dead_code)]

use attendance::geo::GeoPoint;
use attendance::memory::MemoryStore;
use attendance::models::{AttendanceRecord, SessionCode, Student};
use attendance::store::{LedgerStore, SessionRegistryStore};
use chrono::{DateTime, Duration, Utc};

pub const CAMPUS: GeoPoint = GeoPoint {
    lat: 22.5726,
    lng: 88.3639,
};

pub const CURRICULUM: &str = r#"{
    "BE": {
        "ECE": {
            "5": ["DSP", "VLSI", "Analog Electronics"]
        }
    }
}"#;

pub fn student(roll_no: &str, name: &str, section: &str) -> Student {
    Student {
        roll_no: roll_no.into(),
        full_name: name.into(),
        course: "BE".into(),
        branch: "ECE".into(),
        semester: 5,
        section: section.into(),
    }
}

pub fn session(code: &str, teacher: &str, subject: &str, start: DateTime<Utc>) -> SessionCode {
    SessionCode {
        code: code.into(),
        teacher_id: teacher.into(),
        subject: subject.into(),
        start_time: start,
        end_time: start + Duration::minutes(10),
        issuer_location: Some(CAMPUS),
    }
}

pub async fn insert_session(store: &MemoryStore, session: &SessionCode) {
    assert!(store.insert(session).await.unwrap(), "duplicate fixture code");
}

/// Appends a ledger entry directly, bypassing the marking checks
pub async fn insert_record(
    store: &MemoryStore,
    student_id: &str,
    session: &SessionCode,
    marked_at: DateTime<Utc>,
) {
    let record = AttendanceRecord {
        student_id: student_id.into(),
        student_name: student_id.into(),
        subject: session.subject.clone(),
        session_code: session.code.clone(),
        device_fingerprint: format!("{student_id}-{}", session.code),
        marked_at,
        location: CAMPUS,
    };
    store
        .append(&record, marked_at - Duration::minutes(50))
        .await
        .unwrap();
}
