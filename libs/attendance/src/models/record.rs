//! Attendance ledger entries and mark requests

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// One successful marking; never updated once appended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub student_id: String,
    pub student_name: String,
    pub subject: String,
    pub session_code: String,
    pub device_fingerprint: String,
    pub marked_at: DateTime<Utc>,
    pub location: GeoPoint,
}

/// A student's attempt to mark attendance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkRequest {
    pub student_id: String,
    pub code: String,
    pub subject: String,
    pub device_fingerprint: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl MarkRequest {
    /// The reported location, only when both coordinates are present
    pub fn location(&self) -> Option<GeoPoint> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
            _ => None,
        }
    }
}
