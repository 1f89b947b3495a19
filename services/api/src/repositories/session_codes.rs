//! Session code repository

use attendance::geo::GeoPoint;
use attendance::models::SessionCode;
use attendance::store::{SessionFilter, SessionRegistryStore};
use chrono::{DateTime, Utc};
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, Row, postgres::PgRow};

/// Unset criteria are bound as NULL and match every row
const FILTER_CLAUSE: &str = r#"
    WHERE ($1::TEXT IS NULL OR teacher_id = $1)
      AND ($2::TEXT[] IS NULL OR subject = ANY($2))
      AND ($3::TIMESTAMPTZ IS NULL OR start_time >= $3)
      AND ($4::TIMESTAMPTZ IS NULL OR start_time < $4)
      AND ($5::TIMESTAMPTZ IS NULL OR end_time > $5)
"#;

type PgQuery<'q> = sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>;

/// Session code repository for database operations
#[derive(Clone)]
pub struct SessionCodeRepository {
    pool: PgPool,
}

fn session_from_row(row: &PgRow) -> SessionCode {
    let lat: Option<f64> = row.get("issuer_lat");
    let lng: Option<f64> = row.get("issuer_lng");

    SessionCode {
        code: row.get("code"),
        teacher_id: row.get("teacher_id"),
        subject: row.get("subject"),
        start_time: row.get("start_time"),
        end_time: row.get("end_time"),
        issuer_location: lat.zip(lng).map(|(lat, lng)| GeoPoint::new(lat, lng)),
    }
}

fn bind_filter<'q>(query: PgQuery<'q>, filter: &'q SessionFilter) -> PgQuery<'q> {
    let range_start: Option<DateTime<Utc>> = filter.started_within.map(|r| r.start);
    let range_end: Option<DateTime<Utc>> = filter.started_within.map(|r| r.end);

    query
        .bind(filter.teacher_id.as_deref())
        .bind(filter.subjects.as_deref())
        .bind(range_start)
        .bind(range_end)
        .bind(filter.ends_after)
}

impl SessionCodeRepository {
    /// Create a new session code repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl SessionRegistryStore for SessionCodeRepository {
    async fn insert(&self, session: &SessionCode) -> DatabaseResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO session_codes (code, teacher_id, subject, start_time, end_time, issuer_lat, issuer_lng)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (code) DO NOTHING
            "#,
        )
        .bind(&session.code)
        .bind(&session.teacher_id)
        .bind(&session.subject)
        .bind(session.start_time)
        .bind(session.end_time)
        .bind(session.issuer_location.map(|p| p.lat))
        .bind(session.issuer_location.map(|p| p.lng))
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_by_code(&self, code: &str) -> DatabaseResult<Option<SessionCode>> {
        let row = sqlx::query(
            r#"
            SELECT code, teacher_id, subject, start_time, end_time, issuer_lat, issuer_lng
            FROM session_codes
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(row.as_ref().map(session_from_row))
    }

    async fn find(&self, filter: &SessionFilter) -> DatabaseResult<Vec<SessionCode>> {
        let sql = format!(
            "SELECT code, teacher_id, subject, start_time, end_time, issuer_lat, issuer_lng \
             FROM session_codes {FILTER_CLAUSE} ORDER BY start_time"
        );

        let rows = bind_filter(sqlx::query(&sql), filter)
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(rows.iter().map(session_from_row).collect())
    }

    async fn count_matching(&self, filter: &SessionFilter) -> DatabaseResult<u64> {
        let sql = format!("SELECT COUNT(*) AS total FROM session_codes {FILTER_CLAUSE}");

        let row = bind_filter(sqlx::query(&sql), filter)
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        let total: i64 = row.get("total");
        Ok(total.max(0) as u64)
    }
}
