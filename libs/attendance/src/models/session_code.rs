//! Session code model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// A time-boxed code issued by a teacher for one class meeting
///
/// Immutable once stored. `subject` is kept in normalized form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionCode {
    pub code: String,
    pub teacher_id: String,
    pub subject: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub issuer_location: Option<GeoPoint>,
}

impl SessionCode {
    /// Both bounds are inclusive.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.start_time <= now && now <= self.end_time
    }
}

/// Session code issuance payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueSessionCode {
    pub teacher_id: String,
    pub subject: String,
    /// Validity in minutes; the configured default applies when absent
    pub duration_minutes: Option<i64>,
    pub location: Option<GeoPoint>,
}
