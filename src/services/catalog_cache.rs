use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::catalog::{CatalogApi, into_snapshot};
use crate::db::ScheduleStore;
use crate::error::{AppError, FetchError};
use crate::models::{CourseKey, CourseSnapshot};

/// Outcome of [`CatalogCache::ensure_fresh`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Freshness {
    /// The stored snapshot is within the ttl; the catalog was not contacted.
    Fresh,
    /// A new snapshot with this many sections was committed.
    Refreshed { sections: usize },
    /// The catalog has no sections for the course this term. Nothing was
    /// written and the next call will ask again.
    NotOffered,
}

#[derive(Debug, Clone)]
struct Attempt {
    finished_at: Instant,
    outcome: Result<Freshness, FetchError>,
}

type Flight = Arc<tokio::sync::Mutex<Option<Attempt>>>;

/// Keeps stored course snapshots no older than `ttl`, fetching from the
/// catalog at most once at a time per course.
pub struct CatalogCache {
    store: ScheduleStore,
    catalog: Arc<dyn CatalogApi>,
    ttl: Duration,
    fetch_timeout: Duration,
    flights: Mutex<HashMap<CourseKey, Flight>>,
}

impl CatalogCache {
    pub fn new(
        store: ScheduleStore,
        catalog: Arc<dyn CatalogApi>,
        ttl: Duration,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            store,
            catalog,
            ttl,
            fetch_timeout,
            flights: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &ScheduleStore {
        &self.store
    }

    pub async fn ensure_fresh(&self, key: &CourseKey) -> Result<Freshness, AppError> {
        if self.is_fresh(key).await? {
            debug!("{} is fresh, skipping catalog", key);
            return Ok(Freshness::Fresh);
        }

        let arrived = Instant::now();
        let flight = self.flight(key);
        let mut last_attempt = flight.lock().await;
        let result = self.refresh(key, arrived, &mut last_attempt).await;
        self.release(key, &flight);
        result
    }

    /// Runs under the per-key lock. `last_attempt` is the outcome of the
    /// previous refresh on this flight, if any.
    async fn refresh(
        &self,
        key: &CourseKey,
        arrived: Instant,
        last_attempt: &mut Option<Attempt>,
    ) -> Result<Freshness, AppError> {
        // Another caller may have committed while we waited.
        if self.is_fresh(key).await? {
            return Ok(Freshness::Fresh);
        }
        if let Some(attempt) = last_attempt.as_ref() {
            if attempt.finished_at >= arrived {
                debug!("{}: reusing concurrent fetch outcome", key);
                return attempt.outcome.clone().map_err(AppError::from);
            }
        }

        let outcome = self.fetch(key).await;
        let freshness = match outcome {
            Ok(Some(snapshot)) => {
                let sections = snapshot.sections.len();
                if let Err(e) = self.store.replace_course_sections(&snapshot).await {
                    *last_attempt = None;
                    return Err(e.into());
                }
                info!("{}: stored snapshot with {} sections", key, sections);
                Ok(Freshness::Refreshed { sections })
            }
            Ok(None) => {
                warn!("{} is not offered this term", key);
                Ok(Freshness::NotOffered)
            }
            Err(e) => {
                warn!("{}: catalog fetch failed: {}", key, e);
                Err(e)
            }
        };

        *last_attempt = Some(Attempt {
            finished_at: Instant::now(),
            outcome: freshness.clone(),
        });
        freshness.map_err(AppError::from)
    }

    async fn fetch(&self, key: &CourseKey) -> Result<Option<CourseSnapshot>, FetchError> {
        let request = self
            .catalog
            .fetch_schedule(key.term, &key.subject, &key.catalog_number);
        let records = match tokio::time::timeout(self.fetch_timeout, request).await {
            Ok(result) => result?,
            Err(_) => return Err(FetchError::Timeout(self.fetch_timeout)),
        };

        Ok(into_snapshot(key, records, Utc::now()))
    }

    async fn is_fresh(&self, key: &CourseKey) -> Result<bool, AppError> {
        let Some(last_synced_at) = self.store.last_synced_at(key).await? else {
            return Ok(false);
        };

        // A timestamp in the future is treated as stale.
        let fresh = Utc::now()
            .signed_duration_since(last_synced_at)
            .to_std()
            .map(|age| age < self.ttl)
            .unwrap_or(false);
        Ok(fresh)
    }

    fn flight(&self, key: &CourseKey) -> Flight {
        let mut flights = self.flights.lock().unwrap_or_else(PoisonError::into_inner);
        flights.entry(key.clone()).or_default().clone()
    }

    /// Drops the map entry once a refresh is done. Callers already queued on
    /// `flight` keep their handle and still see its outcome; later callers
    /// start a new flight.
    fn release(&self, key: &CourseKey, flight: &Flight) {
        let mut flights = self.flights.lock().unwrap_or_else(PoisonError::into_inner);
        if flights.get(key).is_some_and(|current| Arc::ptr_eq(current, flight)) {
            flights.remove(key);
        }
    }

    #[cfg(test)]
    fn flights_in_use(&self) -> usize {
        self.flights.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
