//! Read-only attendance reports: monthly summary, target projection and
//! per-student history.
//!
//! Totals count session codes by subject and start time; attended counts
//! count the student's ledger entries by subject and mark time. Subjects
//! are scoped by the student's curriculum.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::debug;

use crate::config::AttendanceConfig;
use crate::curriculum::find_subject;
use crate::error::{AttendanceResult, BadRequest, Missing};
use crate::models::{Student, normalize_id, normalize_subject};
use crate::store::{
    CurriculumCatalog, LedgerFilter, LedgerStore, RosterStore, SessionFilter, SessionRegistryStore,
};
use crate::time::{self, DisplayZone, TimeRange};

/// Attended/total counts for one subject or overall
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SubjectStats {
    pub attended: u64,
    pub total: u64,
    pub percentage: f64,
}

impl SubjectStats {
    pub fn new(attended: u64, total: u64) -> Self {
        Self {
            attended,
            total,
            percentage: percentage(attended, total),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectSummary {
    pub subject: String,
    #[serde(flatten)]
    pub stats: SubjectStats,
}

/// Attendance of one student over one calendar month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceSummary {
    pub roll_no: String,
    pub branch: String,
    pub semester: i32,
    pub month: String,
    pub subject_filter: Option<String>,
    pub overall: SubjectStats,
    pub subjects: Vec<SubjectSummary>,
}

#[derive(Debug, Clone)]
pub struct ProjectionQuery {
    pub subject: String,
    pub target_percentage: f64,
    pub from: NaiveDate,
    /// Defaults to today (UTC)
    pub to: Option<NaiveDate>,
}

/// How many consecutive classes bring a student up to a target
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    pub roll_no: String,
    pub subject: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub attended: u64,
    pub total: u64,
    pub current_percentage: f64,
    pub target_percentage: f64,
    pub needed_classes: u64,
    pub message: String,
}

/// One ledger entry as shown to its student
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub subject: String,
    pub marked_at: DateTime<Utc>,
    pub marked_at_local: String,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `attended / total * 100` rounded to two decimals, or 0 without sessions
pub fn percentage(attended: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round2(attended as f64 / total as f64 * 100.0)
}

/// Smallest number of further classes, all attended, that lifts
/// `attended / total` to `target` percent.
///
/// Assumes no other classes are held meanwhile, so both numerator and
/// denominator grow by the same amount.
pub fn classes_needed(attended: u64, total: u64, target: f64) -> AttendanceResult<u64> {
    if !(0.0..=100.0).contains(&target) {
        return Err(BadRequest::InvalidTarget.into());
    }

    let current = if total > 0 {
        attended as f64 / total as f64 * 100.0
    } else {
        0.0
    };
    if current >= target {
        return Ok(0);
    }
    if target >= 100.0 {
        return Err(BadRequest::UnreachableTarget.into());
    }

    let x = (target * total as f64 - 100.0 * attended as f64) / (100.0 - target);
    // float noise must not add a class; at least one class is always needed here
    let needed = (x - 1e-9).ceil().max(1.0);
    Ok(needed as u64)
}

#[derive(Debug, Clone)]
pub struct AnalyticsEngine<R, S, L, C> {
    roster: R,
    sessions: S,
    ledger: L,
    curriculum: C,
    zone: DisplayZone,
}

impl<R, S, L, C> AnalyticsEngine<R, S, L, C>
where
    R: RosterStore,
    S: SessionRegistryStore,
    L: LedgerStore,
    C: CurriculumCatalog,
{
    pub fn new(roster: R, sessions: S, ledger: L, curriculum: C, config: &AttendanceConfig) -> Self {
        Self {
            roster,
            sessions,
            ledger,
            curriculum,
            zone: DisplayZone::from_offset_minutes(config.display_utc_offset_minutes),
        }
    }

    async fn student(&self, student_id: &str) -> AttendanceResult<Student> {
        Ok(self
            .roster
            .find_approved_student(&normalize_id(student_id))
            .await?
            .ok_or(Missing::Student)?)
    }

    fn curriculum_for(&self, student: &Student) -> AttendanceResult<Vec<String>> {
        Ok(self
            .curriculum
            .subjects_for(&student.course, &student.branch, student.semester)
            .ok_or(BadRequest::NoCurriculum)?)
    }

    /// The curriculum entry matching `subject`, in its catalog spelling
    fn curriculum_subject(subjects: &[String], subject: &str) -> AttendanceResult<String> {
        find_subject(subjects, subject)
            .cloned()
            .ok_or_else(|| BadRequest::SubjectNotInCurriculum(subject.trim().to_string()).into())
    }

    async fn stats(
        &self,
        student_id: &str,
        subject: &str,
        range: TimeRange,
    ) -> AttendanceResult<SubjectStats> {
        let subjects = Some(vec![normalize_subject(subject)]);

        let total = self
            .sessions
            .count_matching(&SessionFilter {
                subjects: subjects.clone(),
                started_within: Some(range),
                ..Default::default()
            })
            .await?;

        let attended = self
            .ledger
            .count_matching(&LedgerFilter {
                student_id: Some(student_id.to_string()),
                subjects,
                marked_within: Some(range),
                ..Default::default()
            })
            .await?;

        Ok(SubjectStats::new(attended, total))
    }

    /// Per-subject and overall attendance for one calendar month
    ///
    /// The overall figure weights every session equally, not every subject.
    pub async fn summarize(
        &self,
        student_id: &str,
        month: u32,
        year: i32,
        subject_filter: Option<&str>,
    ) -> AttendanceResult<AttendanceSummary> {
        let student = self.student(student_id).await?;
        let curriculum = self.curriculum_for(&student)?;

        let scope = match subject_filter {
            Some(subject) => vec![Self::curriculum_subject(&curriculum, subject)?],
            None => curriculum,
        };

        let period = time::month_period(year, month)?;
        debug!(
            "Summarizing {} subjects for {} in {}",
            scope.len(),
            student.roll_no,
            time::month_label(&period)
        );

        let mut subjects = Vec::with_capacity(scope.len());
        for subject in scope {
            let stats = self.stats(&student.roll_no, &subject, period).await?;
            subjects.push(SubjectSummary { subject, stats });
        }

        let attended = subjects.iter().map(|s| s.stats.attended).sum();
        let total = subjects.iter().map(|s| s.stats.total).sum();

        Ok(AttendanceSummary {
            roll_no: student.roll_no,
            branch: student.branch,
            semester: student.semester,
            month: time::month_label(&period),
            subject_filter: subject_filter.and_then(|_| subjects.first().map(|s| s.subject.clone())),
            overall: SubjectStats::new(attended, total),
            subjects,
        })
    }

    /// Classes needed to reach a target percentage over a date span
    pub async fn project_needed(
        &self,
        student_id: &str,
        query: &ProjectionQuery,
    ) -> AttendanceResult<Projection> {
        self.project_needed_on(student_id, query, Utc::now().date_naive())
            .await
    }

    /// As [`project_needed`](Self::project_needed) with `today` as the
    /// default end date
    pub async fn project_needed_on(
        &self,
        student_id: &str,
        query: &ProjectionQuery,
        today: NaiveDate,
    ) -> AttendanceResult<Projection> {
        let student = self.student(student_id).await?;
        let curriculum = self.curriculum_for(&student)?;
        let subject = Self::curriculum_subject(&curriculum, &query.subject)?;

        let to = query.to.unwrap_or(today);
        let span = time::date_span(query.from, to)?;

        let stats = self.stats(&student.roll_no, &subject, span).await?;
        let needed_classes = classes_needed(stats.attended, stats.total, query.target_percentage)?;

        let message = if needed_classes == 0 {
            format!(
                "Attendance in {} already meets the {}% target",
                subject, query.target_percentage
            )
        } else {
            format!(
                "Attend the next {} {} classes to reach {}%",
                needed_classes, subject, query.target_percentage
            )
        };

        Ok(Projection {
            roll_no: student.roll_no,
            subject,
            from: query.from,
            to,
            attended: stats.attended,
            total: stats.total,
            current_percentage: stats.percentage,
            target_percentage: query.target_percentage,
            needed_classes,
            message,
        })
    }

    /// Every mark of a student, oldest first, optionally for one subject
    pub async fn history(
        &self,
        student_id: &str,
        subject: Option<&str>,
    ) -> AttendanceResult<Vec<HistoryEntry>> {
        let student = self.student(student_id).await?;

        let subjects = match subject {
            Some(subject) => {
                let curriculum = self.curriculum_for(&student)?;
                let subject = Self::curriculum_subject(&curriculum, subject)?;
                Some(vec![normalize_subject(&subject)])
            }
            None => None,
        };

        let records = self
            .ledger
            .find(&LedgerFilter {
                student_id: Some(student.roll_no),
                subjects,
                ..Default::default()
            })
            .await?;

        Ok(records
            .into_iter()
            .map(|r| HistoryEntry {
                marked_at_local: self.zone.format(r.marked_at),
                marked_at: r.marked_at,
                subject: r.subject,
            })
            .collect())
    }
}
