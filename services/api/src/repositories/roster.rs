//! Approved students and classes

use attendance::models::{ClassInfo, Student};
use attendance::store::RosterStore;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

/// Roster repository for database operations
#[derive(Clone)]
pub struct RosterRepository {
    pool: PgPool,
}

fn student_from_row(row: &PgRow) -> Student {
    Student {
        roll_no: row.get("roll_no"),
        full_name: row.get("full_name"),
        course: row.get("course"),
        branch: row.get("branch"),
        semester: row.get("semester"),
        section: row.get("section"),
    }
}

fn class_from_row(row: &PgRow) -> ClassInfo {
    ClassInfo {
        id: row.get("id"),
        teacher_id: row.get("teacher_id"),
        department: row.get("department"),
        course: row.get("course"),
        branch: row.get("branch"),
        section: row.get("section"),
        semester: row.get("semester"),
        subject: row.get("subject"),
        created_at: row.get("created_at"),
    }
}

impl RosterRepository {
    /// Create a new roster repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Store a new class
    pub async fn create_class(&self, class: &ClassInfo) -> DatabaseResult<()> {
        sqlx::query(
            r#"
            INSERT INTO classes (id, teacher_id, department, course, branch, section, semester, subject, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(class.id)
        .bind(&class.teacher_id)
        .bind(&class.department)
        .bind(&class.course)
        .bind(&class.branch)
        .bind(&class.section)
        .bind(class.semester)
        .bind(&class.subject)
        .bind(class.created_at)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(())
    }

    /// Classes of a teacher, newest first
    pub async fn classes_for_teacher(&self, teacher_id: &str) -> DatabaseResult<Vec<ClassInfo>> {
        let rows = sqlx::query(
            r#"
            SELECT id, teacher_id, department, course, branch, section, semester, subject, created_at
            FROM classes
            WHERE teacher_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(teacher_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(rows.iter().map(class_from_row).collect())
    }
}

impl RosterStore for RosterRepository {
    async fn find_approved_student(&self, student_id: &str) -> DatabaseResult<Option<Student>> {
        let row = sqlx::query(
            r#"
            SELECT roll_no, full_name, course, branch, semester, section
            FROM approved_students
            WHERE roll_no = $1
            "#,
        )
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(row.as_ref().map(student_from_row))
    }

    async fn find_class(&self, class_id: Uuid) -> DatabaseResult<Option<ClassInfo>> {
        let row = sqlx::query(
            r#"
            SELECT id, teacher_id, department, course, branch, section, semester, subject, created_at
            FROM classes
            WHERE id = $1
            "#,
        )
        .bind(class_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(row.as_ref().map(class_from_row))
    }

    async fn find_class_roster(&self, class: &ClassInfo) -> DatabaseResult<Vec<Student>> {
        let rows = sqlx::query(
            r#"
            SELECT roll_no, full_name, course, branch, semester, section
            FROM approved_students
            WHERE course = $1 AND branch = $2 AND section = $3 AND semester = $4
            ORDER BY roll_no
            "#,
        )
        .bind(&class.course)
        .bind(&class.branch)
        .bind(&class.section)
        .bind(class.semester)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(rows.iter().map(student_from_row).collect())
    }
}
