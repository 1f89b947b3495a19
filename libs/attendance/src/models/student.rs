//! Approved student as seen by the attendance core

use serde::{Deserialize, Serialize};

/// Student entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub roll_no: String,
    pub full_name: String,
    /// Program of study, e.g. "BE"; selects the curriculum
    pub course: String,
    pub branch: String,
    pub semester: i32,
    pub section: String,
}
