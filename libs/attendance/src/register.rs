//! Class register: a date × student present/absent matrix.

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::error::{AttendanceResult, BadRequest, Missing};
use crate::models::{ClassInfo, normalize_subject};
use crate::store::{LedgerFilter, LedgerStore, RosterStore, SessionFilter, SessionRegistryStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mark {
    #[serde(rename = "P")]
    Present,
    #[serde(rename = "A")]
    Absent,
}

/// Optional narrowing of the register's sessions
#[derive(Debug, Clone, Copy, Default)]
pub struct RegisterFilter {
    /// Month number (1-12) of the session date, in any year
    pub month: Option<u32>,
    /// Inclusive date range
    pub dates: Option<(NaiveDate, NaiveDate)>,
}

impl RegisterFilter {
    fn validate(&self) -> AttendanceResult<()> {
        if let Some(month) = self.month {
            if !(1..=12).contains(&month) {
                return Err(BadRequest::InvalidMonth(month).into());
            }
        }
        if let Some((from, to)) = self.dates {
            if from > to {
                return Err(BadRequest::InvalidRange.into());
            }
        }
        Ok(())
    }

    fn accepts(&self, date: NaiveDate) -> bool {
        self.month.is_none_or(|month| date.month() == month)
            && self
                .dates
                .is_none_or(|(from, to)| from <= date && date <= to)
    }
}

/// One register column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegisterSession {
    pub code: String,
    pub date: NaiveDate,
}

/// One student's line of the register
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassRegisterRow {
    pub roll_no: String,
    pub name: String,
    /// Aligned with [`ClassRegister::sessions`]
    pub marks: Vec<Mark>,
    pub total_present: usize,
    pub total_classes: usize,
    /// One decimal place, e.g. "66.7%"; "0%" when no class was held
    pub percentage: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassRegister {
    pub class: ClassInfo,
    pub sessions: Vec<RegisterSession>,
    pub rows: Vec<ClassRegisterRow>,
}

impl ClassRegister {
    /// Column labels, one per session (dates repeat when a day had two)
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.sessions.iter().map(|s| s.date).collect()
    }
}

fn format_percentage(present: usize, total: usize) -> String {
    if total == 0 {
        return "0%".to_string();
    }
    format!("{:.1}%", present as f64 / total as f64 * 100.0)
}

#[derive(Debug, Clone)]
pub struct RegisterBuilder<R, S, L> {
    roster: R,
    sessions: S,
    ledger: L,
}

impl<R, S, L> RegisterBuilder<R, S, L>
where
    R: RosterStore,
    S: SessionRegistryStore,
    L: LedgerStore,
{
    pub fn new(roster: R, sessions: S, ledger: L) -> Self {
        Self {
            roster,
            sessions,
            ledger,
        }
    }

    pub async fn build(
        &self,
        class_id: Uuid,
        filter: RegisterFilter,
    ) -> AttendanceResult<ClassRegister> {
        filter.validate()?;

        let class = self
            .roster
            .find_class(class_id)
            .await?
            .ok_or(Missing::Class)?;

        let students = self.roster.find_class_roster(&class).await?;

        let mut sessions: Vec<RegisterSession> = self
            .sessions
            .find(&SessionFilter {
                teacher_id: Some(class.teacher_id.clone()),
                subjects: Some(vec![normalize_subject(&class.subject)]),
                ..Default::default()
            })
            .await?
            .into_iter()
            .map(|s| RegisterSession {
                date: s.start_time.date_naive(),
                code: s.code,
            })
            .filter(|s| filter.accepts(s.date))
            .collect();
        sessions.sort_by_key(|s| s.date);

        let present: HashSet<(String, String)> = if sessions.is_empty() {
            HashSet::new()
        } else {
            self.ledger
                .find(&LedgerFilter {
                    session_codes: Some(sessions.iter().map(|s| s.code.clone()).collect()),
                    ..Default::default()
                })
                .await?
                .into_iter()
                .map(|r| (r.student_id, r.session_code))
                .collect()
        };

        debug!(
            "Building register for class {}: {} students, {} sessions",
            class.id,
            students.len(),
            sessions.len()
        );

        let rows = students
            .into_iter()
            .map(|student| {
                let marks: Vec<Mark> = sessions
                    .iter()
                    .map(|s| {
                        if present.contains(&(student.roll_no.clone(), s.code.clone())) {
                            Mark::Present
                        } else {
                            Mark::Absent
                        }
                    })
                    .collect();
                let total_present = marks.iter().filter(|m| **m == Mark::Present).count();

                ClassRegisterRow {
                    percentage: format_percentage(total_present, marks.len()),
                    total_classes: marks.len(),
                    total_present,
                    marks,
                    roll_no: student.roll_no,
                    name: student.full_name,
                }
            })
            .collect();

        Ok(ClassRegister {
            class,
            sessions,
            rows,
        })
    }
}
