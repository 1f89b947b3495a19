//! Static curriculum catalog loaded from JSON
//!
//! The document maps program → branch → semester → ordered subject list:
//!
//! ```json
//! { "BE": { "ECE": { "5": ["DSP", "VLSI", "AI"] } } }
//! ```

use std::collections::HashMap;

use serde::Deserialize;
use tracing::debug;

use crate::models::normalize_subject;
use crate::store::CurriculumCatalog;

#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct CurriculumDocument(HashMap<String, HashMap<String, HashMap<String, Vec<String>>>>);

/// Curriculum held in memory, keyed by upper-cased program and branch
#[derive(Debug, Clone, Default)]
pub struct StaticCurriculum {
    entries: HashMap<(String, String, String), Vec<String>>,
}

fn key(program: &str, branch: &str, semester: &str) -> (String, String, String) {
    (
        program.trim().to_uppercase(),
        branch.trim().to_uppercase(),
        semester.trim().to_string(),
    )
}

impl StaticCurriculum {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let document: CurriculumDocument = serde_json::from_str(json)?;
        let mut curriculum = Self::default();
        for (program, branches) in document.0 {
            for (branch, semesters) in branches {
                for (semester, subjects) in semesters {
                    curriculum.insert(&program, &branch, &semester, subjects);
                }
            }
        }
        debug!("Loaded curriculum with {} entries", curriculum.entries.len());
        Ok(curriculum)
    }

    pub fn insert(&mut self, program: &str, branch: &str, semester: &str, subjects: Vec<String>) {
        let subjects = subjects
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        self.entries.insert(key(program, branch, semester), subjects);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CurriculumCatalog for StaticCurriculum {
    fn subjects_for(&self, program: &str, branch: &str, semester: i32) -> Option<Vec<String>> {
        self.entries
            .get(&key(program, branch, &semester.to_string()))
            .cloned()
    }
}

/// The entry of `subjects` naming `subject`, ignoring case and surrounding blanks
pub fn find_subject<'a>(subjects: &'a [String], subject: &str) -> Option<&'a String> {
    let wanted = normalize_subject(subject);
    subjects.iter().find(|s| normalize_subject(s) == wanted)
}
