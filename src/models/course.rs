use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::section::SectionEntry;

/// Identifies one course offering: (term, subject, catalog number).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CourseKey {
    pub term: u32,
    pub subject: String,
    pub catalog_number: String,
}

impl CourseKey {
    pub fn new(term: u32, subject: impl Into<String>, catalog_number: impl Into<String>) -> Self {
        Self {
            term,
            subject: subject.into(),
            catalog_number: catalog_number.into(),
        }
    }
}

impl fmt::Display for CourseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.subject, self.catalog_number, self.term)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub term: u32,
    pub subject: String,
    pub catalog_number: String,
    pub title: String,
    pub topic: Option<String>,
    pub note: Option<String>,
    pub academic_level: String,
    pub units: f64,
    /// Last modification time as reported by the catalog.
    pub last_updated: Option<String>,
    /// When this snapshot was fetched locally.
    pub last_synced_at: DateTime<Utc>,
    pub snapshot_id: String,
}

impl Course {
    pub fn key(&self) -> CourseKey {
        CourseKey::new(self.term, self.subject.clone(), self.catalog_number.clone())
    }
}

/// Everything stored for one course, replaced as a unit on refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseSnapshot {
    pub course: Course,
    /// Ordered by label.
    pub sections: Vec<SectionEntry>,
}

impl CourseSnapshot {
    pub fn key(&self) -> CourseKey {
        self.course.key()
    }

    pub fn section(&self, label: &str) -> Option<&SectionEntry> {
        self.sections.iter().find(|entry| entry.section.label == label)
    }
}
