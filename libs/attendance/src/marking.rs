//! Attendance marking engine
//!
//! A mark request is checked in a fixed order and the first failing check
//! wins:
//!
//! 1. the student is approved
//! 2. the code exists
//! 3. the code is active (inclusive bounds)
//! 4. the subject matches the code's subject
//! 5. the student has not marked this code yet
//! 6. the request carries a location
//! 7. the code carries its issuer location
//! 8. the student is inside the geofence
//! 9. the device has not marked within the reuse window
//!
//! Only then is a record appended. The append itself re-checks 5 and 9
//! atomically, so concurrent requests cannot both succeed.

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::config::AttendanceConfig;
use crate::error::{
    AttendanceError, AttendanceResult, Conflict, Integrity, InvalidInput, InvalidState, Mismatch,
    Missing,
};
use crate::models::{AttendanceRecord, MarkRequest, normalize_id, normalize_subject};
use crate::store::{AppendOutcome, LedgerStore, RosterStore, SessionRegistryStore};

#[derive(Debug, Clone)]
pub struct MarkingEngine<R, S, L> {
    roster: R,
    sessions: S,
    ledger: L,
    config: AttendanceConfig,
}

impl<R, S, L> MarkingEngine<R, S, L>
where
    R: RosterStore,
    S: SessionRegistryStore,
    L: LedgerStore,
{
    pub fn new(roster: R, sessions: S, ledger: L, config: AttendanceConfig) -> Self {
        Self {
            roster,
            sessions,
            ledger,
            config,
        }
    }

    /// Mark attendance at the current instant
    pub async fn mark(&self, request: &MarkRequest) -> AttendanceResult<AttendanceRecord> {
        self.mark_at(request, Utc::now()).await
    }

    /// Mark attendance as if the request arrived at `now`
    pub async fn mark_at(
        &self,
        request: &MarkRequest,
        now: DateTime<Utc>,
    ) -> AttendanceResult<AttendanceRecord> {
        let result = self.validate_and_append(request, now).await;

        match &result {
            Ok(record) => info!(
                "Attendance marked for {} on code {} ({})",
                record.student_id, record.session_code, record.subject
            ),
            Err(AttendanceError::Internal(e)) => {
                error!("Data integrity fault while marking attendance: {}", e)
            }
            Err(AttendanceError::Database(e)) => {
                error!("Storage failure while marking attendance: {}", e)
            }
            Err(e) => warn!(
                "Attendance rejected for {} on code {}: {}",
                request.student_id, request.code, e
            ),
        }

        result
    }

    async fn validate_and_append(
        &self,
        request: &MarkRequest,
        now: DateTime<Utc>,
    ) -> AttendanceResult<AttendanceRecord> {
        let student_id = normalize_id(&request.student_id);
        let code = request.code.trim();
        let subject = normalize_subject(&request.subject);

        let student = self
            .roster
            .find_approved_student(&student_id)
            .await?
            .ok_or(Missing::Student)?;

        let session = self
            .sessions
            .find_by_code(code)
            .await?
            .ok_or(Missing::Session)?;

        if !session.is_active_at(now) {
            return Err(InvalidState::SessionExpiredOrNotStarted.into());
        }

        if normalize_subject(&session.subject) != subject {
            return Err(Mismatch::Subject.into());
        }

        if self.ledger.exists(&student_id, &session.code).await? {
            return Err(Conflict::AlreadyMarked.into());
        }

        let location = request.location().ok_or(InvalidInput::LocationRequired)?;

        let issuer = session
            .issuer_location
            .ok_or_else(|| Integrity::NoIssuerLocation {
                code: session.code.clone(),
            })?;

        let distance_m = location.distance_to(&issuer);
        if !distance_m.is_finite() || distance_m > self.config.geofence_radius_m {
            return Err(InvalidState::TooFarFromIssuer {
                distance_m,
                limit_m: self.config.geofence_radius_m,
            }
            .into());
        }

        let window_start = now - self.config.device_reuse_window();
        let recent = self
            .ledger
            .find_recent_by_device(&request.device_fingerprint, window_start)
            .await?;
        if !recent.is_empty() {
            return Err(Conflict::DeviceReuse.into());
        }

        let record = AttendanceRecord {
            student_id,
            student_name: student.full_name,
            subject,
            session_code: session.code,
            device_fingerprint: request.device_fingerprint.clone(),
            marked_at: now,
            location,
        };

        match self.ledger.append(&record, window_start).await? {
            AppendOutcome::Inserted => Ok(record),
            AppendOutcome::AlreadyMarked => Err(Conflict::AlreadyMarked.into()),
            AppendOutcome::DeviceReused => Err(Conflict::DeviceReuse.into()),
        }
    }
}
