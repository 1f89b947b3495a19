//! Tunable domain constants for marking and session code issuance.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Attendance engine configuration
///
/// Every field has a default, so a partial document (or none at all)
/// deserializes into a usable configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttendanceConfig {
    /// Maximum distance between issuer and student, in meters (default: 100)
    pub geofence_radius_m: f64,
    /// Window during which a device may mark only once, in minutes (default: 50)
    pub device_reuse_window_minutes: i64,
    /// Default validity of an issued session code, in minutes (default: 10)
    pub session_code_minutes: i64,
    /// Longest validity a teacher may request, in minutes (default: 180)
    pub max_session_code_minutes: i64,
    /// Attempts at drawing an unused code before giving up (default: 5)
    pub code_issue_attempts: u32,
    /// Offset of the display timezone from UTC, in minutes (default: 330 = +05:30)
    pub display_utc_offset_minutes: i32,
}

impl Default for AttendanceConfig {
    fn default() -> Self {
        Self {
            geofence_radius_m: 100.0,
            device_reuse_window_minutes: 50,
            session_code_minutes: 10,
            max_session_code_minutes: 180,
            code_issue_attempts: 5,
            display_utc_offset_minutes: 330,
        }
    }
}

impl AttendanceConfig {
    pub fn device_reuse_window(&self) -> Duration {
        Duration::minutes(self.device_reuse_window_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config: AttendanceConfig =
            serde_json::from_str(r#"{"geofence_radius_m": 150.0}"#).unwrap();
        assert_eq!(config.geofence_radius_m, 150.0);
        assert_eq!(config.device_reuse_window_minutes, 50);
        assert_eq!(config.device_reuse_window(), Duration::minutes(50));
        assert_eq!(config.display_utc_offset_minutes, 330);
    }
}
