//! Class model: one teacher teaching one subject to one section

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Class entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassInfo {
    pub id: Uuid,
    pub teacher_id: String,
    pub department: String,
    pub course: String,
    pub branch: String,
    pub section: String,
    pub semester: i32,
    pub subject: String,
    pub created_at: DateTime<Utc>,
}

/// New class creation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewClass {
    pub teacher_id: String,
    pub department: String,
    pub course: String,
    pub branch: String,
    pub section: String,
    pub semester: i32,
    pub subject: String,
}

impl ClassInfo {
    /// Build a class from its creation payload with normalized ids and subject
    pub fn from_new(new_class: NewClass, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            teacher_id: super::normalize_id(&new_class.teacher_id),
            department: new_class.department.trim().to_string(),
            course: new_class.course.trim().to_string(),
            branch: new_class.branch.trim().to_string(),
            section: new_class.section.trim().to_uppercase(),
            semester: new_class.semester,
            subject: super::normalize_subject(&new_class.subject),
            created_at: now,
        }
    }
}
