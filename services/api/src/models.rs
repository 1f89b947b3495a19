//! API models for request and response payloads

use attendance::geo::GeoPoint;
use attendance::models::IssueSessionCode;
use attendance::register::RegisterFilter;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Request for issuing a session code
#[derive(Debug, Deserialize)]
pub struct IssueCodeRequest {
    pub teacher_id: String,
    pub subject: String,
    pub duration_minutes: Option<i64>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl From<IssueCodeRequest> for IssueSessionCode {
    fn from(request: IssueCodeRequest) -> Self {
        let location = request.lat.zip(request.lng).map(|(lat, lng)| GeoPoint::new(lat, lng));
        Self {
            teacher_id: request.teacher_id,
            subject: request.subject,
            duration_minutes: request.duration_minutes,
            location,
        }
    }
}

/// Response for a freshly issued session code
#[derive(Debug, Serialize)]
pub struct IssuedCodeResponse {
    pub code: String,
    pub subject: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub valid_minutes: i64,
}

/// Response for a successful marking
#[derive(Debug, Serialize)]
pub struct MarkAttendanceResponse {
    pub message: String,
    pub roll_no: String,
    pub subject: String,
    pub marked_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub subject: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisQuery {
    pub month: u32,
    pub year: i32,
    pub subject: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectionParams {
    pub subject: String,
    pub target: f64,
    pub from: NaiveDate,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RegisterQuery {
    pub month: Option<u32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl TryFrom<RegisterQuery> for RegisterFilter {
    type Error = ApiError;

    fn try_from(query: RegisterQuery) -> Result<Self, Self::Error> {
        let dates = match (query.start_date, query.end_date) {
            (Some(from), Some(to)) => Some((from, to)),
            (None, None) => None,
            _ => {
                return Err(ApiError::BadRequest(
                    "start_date and end_date must be given together".to_string(),
                ));
            }
        };

        Ok(RegisterFilter {
            month: query.month,
            dates,
        })
    }
}
