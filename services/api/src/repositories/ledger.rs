//! Attendance ledger repository

use attendance::geo::GeoPoint;
use attendance::models::AttendanceRecord;
use attendance::store::{AppendOutcome, LedgerFilter, LedgerStore};
use chrono::{DateTime, Utc};
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::debug;

const RECORD_COLUMNS: &str =
    "student_id, student_name, subject, session_code, device_fingerprint, marked_at, lat, lng";

/// Unset criteria are bound as NULL and match every row
const FILTER_CLAUSE: &str = r#"
    WHERE ($1::TEXT IS NULL OR student_id = $1)
      AND ($2::TEXT[] IS NULL OR subject = ANY($2))
      AND ($3::TEXT[] IS NULL OR session_code = ANY($3))
      AND ($4::TIMESTAMPTZ IS NULL OR marked_at >= $4)
      AND ($5::TIMESTAMPTZ IS NULL OR marked_at < $5)
"#;

type PgQuery<'q> = sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>;

/// Attendance repository for database operations
#[derive(Clone)]
pub struct AttendanceRepository {
    pool: PgPool,
}

fn record_from_row(row: &PgRow) -> AttendanceRecord {
    AttendanceRecord {
        student_id: row.get("student_id"),
        student_name: row.get("student_name"),
        subject: row.get("subject"),
        session_code: row.get("session_code"),
        device_fingerprint: row.get("device_fingerprint"),
        marked_at: row.get("marked_at"),
        location: GeoPoint::new(row.get("lat"), row.get("lng")),
    }
}

fn bind_filter<'q>(query: PgQuery<'q>, filter: &'q LedgerFilter) -> PgQuery<'q> {
    let range_start: Option<DateTime<Utc>> = filter.marked_within.map(|r| r.start);
    let range_end: Option<DateTime<Utc>> = filter.marked_within.map(|r| r.end);

    query
        .bind(filter.student_id.as_deref())
        .bind(filter.subjects.as_deref())
        .bind(filter.session_codes.as_deref())
        .bind(range_start)
        .bind(range_end)
}

impl AttendanceRepository {
    /// Create a new attendance repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl LedgerStore for AttendanceRepository {
    async fn exists(&self, student_id: &str, session_code: &str) -> DatabaseResult<bool> {
        let found: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM attendance_records
                WHERE student_id = $1 AND session_code = $2
            )
            "#,
        )
        .bind(student_id)
        .bind(session_code)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(found)
    }

    async fn find_recent_by_device(
        &self,
        device_fingerprint: &str,
        since: DateTime<Utc>,
    ) -> DatabaseResult<Vec<AttendanceRecord>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM attendance_records \
             WHERE device_fingerprint = $1 AND marked_at >= $2 ORDER BY marked_at"
        );

        let rows = sqlx::query(&sql)
            .bind(device_fingerprint)
            .bind(since)
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(rows.iter().map(record_from_row).collect())
    }

    /// Runs in one transaction holding an advisory lock on the device
    /// fingerprint, so two requests from one device serialize here. The
    /// unique key on (student_id, session_code) settles the other race.
    async fn append(
        &self,
        record: &AttendanceRecord,
        device_window_start: DateTime<Utc>,
    ) -> DatabaseResult<AppendOutcome> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::Query)?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(&record.device_fingerprint)
            .execute(&mut *tx)
            .await
            .map_err(DatabaseError::Query)?;

        let device_used: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM attendance_records
                WHERE device_fingerprint = $1 AND marked_at >= $2
            )
            "#,
        )
        .bind(&record.device_fingerprint)
        .bind(device_window_start)
        .fetch_one(&mut *tx)
        .await
        .map_err(DatabaseError::Query)?;

        if device_used {
            debug!("Device reuse detected for {}", record.student_id);
            tx.rollback().await.map_err(DatabaseError::Query)?;
            return Ok(AppendOutcome::DeviceReused);
        }

        let sql = format!(
            "INSERT INTO attendance_records ({RECORD_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (student_id, session_code) DO NOTHING"
        );
        let result = sqlx::query(&sql)
            .bind(&record.student_id)
            .bind(&record.student_name)
            .bind(&record.subject)
            .bind(&record.session_code)
            .bind(&record.device_fingerprint)
            .bind(record.marked_at)
            .bind(record.location.lat)
            .bind(record.location.lng)
            .execute(&mut *tx)
            .await
            .map_err(DatabaseError::Query)?;

        if result.rows_affected() == 0 {
            tx.rollback().await.map_err(DatabaseError::Query)?;
            return Ok(AppendOutcome::AlreadyMarked);
        }

        tx.commit().await.map_err(DatabaseError::Query)?;
        Ok(AppendOutcome::Inserted)
    }

    async fn find(&self, filter: &LedgerFilter) -> DatabaseResult<Vec<AttendanceRecord>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM attendance_records {FILTER_CLAUSE} ORDER BY marked_at"
        );

        let rows = bind_filter(sqlx::query(&sql), filter)
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(rows.iter().map(record_from_row).collect())
    }

    async fn count_matching(&self, filter: &LedgerFilter) -> DatabaseResult<u64> {
        let sql = format!("SELECT COUNT(*) AS total FROM attendance_records {FILTER_CLAUSE}");

        let row = bind_filter(sqlx::query(&sql), filter)
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        let total: i64 = row.get("total");
        Ok(total.max(0) as u64)
    }
}
