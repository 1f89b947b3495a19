//! Error types for the attendance core
//!
//! Every failure carries one of the kinds in [`ErrorKind`]; callers decide
//! how to surface it. All variants abort the operation before any write.

use common::error::DatabaseError;
use serde::Serialize;
use thiserror::Error;

/// Entity that a lookup failed to resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Missing {
    #[error("Student not found")]
    Student,
    #[error("Invalid session code")]
    Session,
    #[error("Class not found")]
    Class,
    #[error("No attendance records found")]
    Records,
}

/// A required request field was absent or empty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidInput {
    #[error("Location (lat/lng) required to mark attendance")]
    LocationRequired,
    #[error("Subject is required")]
    SubjectRequired,
    #[error("Teacher id is required")]
    TeacherRequired,
}

/// The request is well formed but the current state does not allow it
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidState {
    #[error("Session code expired or not active")]
    SessionExpiredOrNotStarted,
    #[error("Too far from teacher's location ({} m > {} m)", .distance_m.round(), .limit_m.round())]
    TooFarFromIssuer { distance_m: f64, limit_m: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Mismatch {
    #[error("Subject does not match session code")]
    Subject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Conflict {
    #[error("Attendance already marked")]
    AlreadyMarked,
    #[error("Attendance already marked from this device recently")]
    DeviceReuse,
}

/// Malformed query parameters
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BadRequest {
    #[error("Subjects not defined for this branch/semester")]
    NoCurriculum,
    #[error("Subject '{0}' not in student curriculum")]
    SubjectNotInCurriculum(String),
    #[error("Start date must not be after end date")]
    InvalidRange,
    #[error("Invalid period: month {month} of year {year}")]
    InvalidPeriod { year: i32, month: u32 },
    #[error("Month must be between 1 and 12, got {0}")]
    InvalidMonth(u32),
    #[error("Target percentage must be between 0 and 100")]
    InvalidTarget,
    #[error("A target of 100% cannot be reached once a class has been missed")]
    UnreachableTarget,
    #[error("Session code duration must be between 1 and {max} minutes")]
    InvalidDuration { max: i64 },
}

/// Upstream data corruption; never caused by the client
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Integrity {
    #[error("Teacher location not available for session code {code}")]
    NoIssuerLocation { code: String },
    #[error("Could not allocate a free session code after {attempts} attempts")]
    CodeSpaceExhausted { attempts: u32 },
}

/// Coarse classification of an [`AttendanceError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    InvalidState,
    Mismatch,
    Conflict,
    BadRequest,
    InternalError,
}

#[derive(Debug, Error)]
pub enum AttendanceError {
    #[error(transparent)]
    NotFound(#[from] Missing),

    #[error(transparent)]
    InvalidInput(#[from] InvalidInput),

    #[error(transparent)]
    InvalidState(#[from] InvalidState),

    #[error(transparent)]
    Mismatch(#[from] Mismatch),

    #[error(transparent)]
    Conflict(#[from] Conflict),

    #[error(transparent)]
    BadRequest(#[from] BadRequest),

    #[error(transparent)]
    Internal(#[from] Integrity),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl AttendanceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AttendanceError::NotFound(_) => ErrorKind::NotFound,
            AttendanceError::InvalidInput(_) => ErrorKind::InvalidInput,
            AttendanceError::InvalidState(_) => ErrorKind::InvalidState,
            AttendanceError::Mismatch(_) => ErrorKind::Mismatch,
            AttendanceError::Conflict(_) => ErrorKind::Conflict,
            AttendanceError::BadRequest(_) => ErrorKind::BadRequest,
            AttendanceError::Internal(_) | AttendanceError::Database(_) => {
                ErrorKind::InternalError
            }
        }
    }
}

pub type AttendanceResult<T> = Result<T, AttendanceError>;
