use serde::Serialize;

use crate::db::ScheduleStore;
use crate::error::AppError;
use crate::models::{Course, CourseKey, CourseSnapshot, Location, Reserve, TimeSchedule};
use crate::schedule;

use super::catalog_cache::{CatalogCache, Freshness};

/// Open/closed state of one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionStatus {
    pub label: String,
    pub open: bool,
}

/// Read-side entry point. Every query refreshes the course first when its
/// snapshot is stale; a course that is not offered reads as empty.
pub struct CourseQueries {
    cache: CatalogCache,
}

impl CourseQueries {
    pub fn new(cache: CatalogCache) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &CatalogCache {
        &self.cache
    }

    fn store(&self) -> &ScheduleStore {
        self.cache.store()
    }

    /// Returns the key when the course has data to read.
    async fn offered(&self, subject: &str, catalog: &str) -> Result<Option<CourseKey>, AppError> {
        let key = self.store().key(subject, catalog);
        match self.cache.ensure_fresh(&key).await? {
            Freshness::NotOffered => Ok(None),
            Freshness::Fresh | Freshness::Refreshed { .. } => Ok(Some(key)),
        }
    }

    async fn snapshot(&self, subject: &str, catalog: &str) -> Result<Option<CourseSnapshot>, AppError> {
        let Some(key) = self.offered(subject, catalog).await? else {
            return Ok(None);
        };
        Ok(self.store().load_course_snapshot(&key).await?)
    }

    pub async fn course(&self, subject: &str, catalog: &str) -> Result<Option<Course>, AppError> {
        let Some(key) = self.offered(subject, catalog).await? else {
            return Ok(None);
        };
        Ok(self.store().find_course(&key).await?)
    }

    /// False for unknown sections.
    pub async fn is_open(&self, subject: &str, catalog: &str, section: &str) -> Result<bool, AppError> {
        let Some(key) = self.offered(subject, catalog).await? else {
            return Ok(false);
        };
        let entry = self.store().find_section(&key, section).await?;
        Ok(entry.is_some_and(|entry| entry.is_open()))
    }

    /// Open sections grouped by component, e.g.
    /// `[["LEC 001", "LEC 002"], ["TUT 101"]]`.
    pub async fn open_sections(&self, subject: &str, catalog: &str) -> Result<Vec<Vec<String>>, AppError> {
        let Some(snapshot) = self.snapshot(subject, catalog).await? else {
            return Ok(Vec::new());
        };
        Ok(schedule::group_open_sections(&snapshot.sections)
            .into_iter()
            .map(|group| group.labels)
            .collect())
    }

    pub async fn related_sections(
        &self,
        subject: &str,
        catalog: &str,
        section: &str,
    ) -> Result<Vec<Vec<String>>, AppError> {
        let Some(snapshot) = self.snapshot(subject, catalog).await? else {
            return Ok(Vec::new());
        };
        Ok(schedule::related_sections(&snapshot, section))
    }

    pub async fn time_schedule(
        &self,
        subject: &str,
        catalog: &str,
        section: &str,
    ) -> Result<TimeSchedule, AppError> {
        let Some(key) = self.offered(subject, catalog).await? else {
            return Ok(TimeSchedule::default());
        };
        let meetings = self.store().fetch_meetings(&key, section).await?;
        Ok(TimeSchedule::from_meetings(&meetings))
    }

    /// Distinct instructors in meeting order.
    pub async fn instructors(
        &self,
        subject: &str,
        catalog: &str,
        section: &str,
    ) -> Result<Vec<String>, AppError> {
        let Some(key) = self.offered(subject, catalog).await? else {
            return Ok(Vec::new());
        };
        let meetings = self.store().fetch_meetings(&key, section).await?;

        let mut instructors: Vec<String> = Vec::new();
        for name in meetings.into_iter().flat_map(|m| m.instructors) {
            if !instructors.contains(&name) {
                instructors.push(name);
            }
        }
        Ok(instructors)
    }

    pub async fn reserve_info(
        &self,
        subject: &str,
        catalog: &str,
        section: &str,
    ) -> Result<Vec<Reserve>, AppError> {
        let Some(key) = self.offered(subject, catalog).await? else {
            return Ok(Vec::new());
        };
        Ok(self.store().fetch_reserves(&key, section).await?)
    }

    /// Distinct meeting locations in meeting order.
    pub async fn location(
        &self,
        subject: &str,
        catalog: &str,
        section: &str,
    ) -> Result<Vec<Location>, AppError> {
        let Some(key) = self.offered(subject, catalog).await? else {
            return Ok(Vec::new());
        };
        let meetings = self.store().fetch_meetings(&key, section).await?;

        let mut locations: Vec<Location> = Vec::new();
        for location in meetings.iter().map(|m| m.location()) {
            if location.building.is_none() && location.room.is_none() {
                continue;
            }
            if !locations.contains(&location) {
                locations.push(location);
            }
        }
        Ok(locations)
    }

    /// Every section of one component ("LEC", "TUT", ...) with its status.
    pub async fn component_sections(
        &self,
        subject: &str,
        catalog: &str,
        component: &str,
    ) -> Result<Vec<SectionStatus>, AppError> {
        let Some(key) = self.offered(subject, catalog).await? else {
            return Ok(Vec::new());
        };

        Ok(self
            .store()
            .sections_with_prefix(&key, component)
            .await?
            .into_iter()
            .map(|entry| SectionStatus {
                open: entry.is_open(),
                label: entry.section.label,
            })
            .collect())
    }

    /// Labels of the sections in association group `group`.
    pub async fn associated_sections(
        &self,
        subject: &str,
        catalog: &str,
        group: i64,
    ) -> Result<Vec<String>, AppError> {
        let Some(key) = self.offered(subject, catalog).await? else {
            return Ok(Vec::new());
        };
        Ok(self
            .store()
            .sections_with_associated_class(&key, group)
            .await?
            .into_iter()
            .map(|section| section.label)
            .collect())
    }
}
