//! Session code issuance and lookup
//!
//! Codes are six random digits. Expiry is evaluated lazily against the wall
//! clock on every read; nothing is swept.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::AttendanceConfig;
use crate::error::{AttendanceResult, BadRequest, Integrity, InvalidInput, Missing};
use crate::models::{IssueSessionCode, SessionCode, normalize_id, normalize_subject};
use crate::store::{SessionFilter, SessionRegistryStore};
use crate::time::DisplayZone;

/// Session code details rendered for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionCodeView {
    pub code: String,
    pub subject: String,
    pub start_time: String,
    pub end_time: String,
    pub active: bool,
}

/// A code that has not yet expired
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveSessionCode {
    pub code: String,
    pub subject: String,
    pub end_time: String,
}

fn generate_code<R: Rng>(rng: &mut R) -> String {
    rng.gen_range(100_000..=999_999).to_string()
}

#[derive(Debug, Clone)]
pub struct SessionCodeRegistry<S> {
    sessions: S,
    config: AttendanceConfig,
    zone: DisplayZone,
}

impl<S: SessionRegistryStore> SessionCodeRegistry<S> {
    pub fn new(sessions: S, config: AttendanceConfig) -> Self {
        let zone = DisplayZone::from_offset_minutes(config.display_utc_offset_minutes);
        Self {
            sessions,
            config,
            zone,
        }
    }

    /// Issue a new code valid from now
    pub async fn issue(&self, request: IssueSessionCode) -> AttendanceResult<SessionCode> {
        self.issue_at(request, Utc::now()).await
    }

    pub async fn issue_at(
        &self,
        request: IssueSessionCode,
        now: DateTime<Utc>,
    ) -> AttendanceResult<SessionCode> {
        let teacher_id = normalize_id(&request.teacher_id);
        if teacher_id.is_empty() {
            return Err(InvalidInput::TeacherRequired.into());
        }

        let subject = normalize_subject(&request.subject);
        if subject.is_empty() {
            return Err(InvalidInput::SubjectRequired.into());
        }

        let minutes = request
            .duration_minutes
            .unwrap_or(self.config.session_code_minutes);
        if minutes < 1 || minutes > self.config.max_session_code_minutes {
            return Err(BadRequest::InvalidDuration {
                max: self.config.max_session_code_minutes,
            }
            .into());
        }

        for _ in 0..self.config.code_issue_attempts {
            let session = SessionCode {
                code: generate_code(&mut rand::thread_rng()),
                teacher_id: teacher_id.clone(),
                subject: subject.clone(),
                start_time: now,
                end_time: now + Duration::minutes(minutes),
                issuer_location: request.location,
            };

            if self.sessions.insert(&session).await? {
                info!(
                    "Issued session code for teacher {} ({}) valid for {} minutes",
                    session.teacher_id, session.subject, minutes
                );
                if session.issuer_location.is_none() {
                    warn!(
                        "Session code {} issued without a teacher location; marking will fail",
                        session.code
                    );
                }
                return Ok(session);
            }
        }

        error!(
            "Could not allocate a session code after {} attempts",
            self.config.code_issue_attempts
        );
        Err(Integrity::CodeSpaceExhausted {
            attempts: self.config.code_issue_attempts,
        }
        .into())
    }

    /// Look up a code, reporting its window in the display timezone
    pub async fn check(&self, code: &str) -> AttendanceResult<SessionCodeView> {
        self.check_at(code, Utc::now()).await
    }

    pub async fn check_at(&self, code: &str, now: DateTime<Utc>) -> AttendanceResult<SessionCodeView> {
        let session = self
            .sessions
            .find_by_code(code.trim())
            .await?
            .ok_or(Missing::Session)?;

        Ok(SessionCodeView {
            active: session.is_active_at(now),
            start_time: self.zone.format(session.start_time),
            end_time: self.zone.format(session.end_time),
            code: session.code,
            subject: session.subject,
        })
    }

    /// Codes of `teacher_id` that end after `now`, latest expiry first
    pub async fn active_for_teacher(
        &self,
        teacher_id: &str,
        now: DateTime<Utc>,
    ) -> AttendanceResult<Vec<ActiveSessionCode>> {
        let filter = SessionFilter {
            teacher_id: Some(normalize_id(teacher_id)),
            ends_after: Some(now),
            ..Default::default()
        };

        let mut sessions = self.sessions.find(&filter).await?;
        sessions.sort_by(|a, b| b.end_time.cmp(&a.end_time));

        Ok(sessions
            .into_iter()
            .map(|s| ActiveSessionCode {
                end_time: self.zone.format(s.end_time),
                code: s.code,
                subject: s.subject,
            })
            .collect())
    }
}
