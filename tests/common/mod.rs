#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use uwcourses::catalog::{CatalogApi, RawSection};
use uwcourses::db::{ScheduleStore, open_in_memory};
use uwcourses::error::FetchError;
use uwcourses::services::{CatalogCache, CourseQueries};

pub const TERM: u32 = 1159;

#[derive(Clone)]
enum Reply {
    Records(Vec<RawSection>),
    Fail(FetchError),
}

/// Scripted catalog that counts how often it is asked.
pub struct MockCatalog {
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    delay: Mutex<Duration>,
    replies: Mutex<HashMap<(String, String), Reply>>,
}

impl MockCatalog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            delay: Mutex::new(Duration::ZERO),
            replies: Mutex::new(HashMap::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Most calls that were running at the same time.
    pub fn max_concurrent_calls(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn set_records(&self, subject: &str, catalog: &str, records: Value) {
        let records: Vec<RawSection> = serde_json::from_value(records).expect("raw sections");
        self.replies
            .lock()
            .unwrap()
            .insert((subject.to_string(), catalog.to_string()), Reply::Records(records));
    }

    pub fn set_error(&self, subject: &str, catalog: &str, error: FetchError) {
        self.replies
            .lock()
            .unwrap()
            .insert((subject.to_string(), catalog.to_string()), Reply::Fail(error));
    }
}

#[async_trait]
impl CatalogApi for MockCatalog {
    async fn fetch_schedule(
        &self,
        _term: u32,
        subject: &str,
        catalog_number: &str,
    ) -> Result<Vec<RawSection>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let reply = self
            .replies
            .lock()
            .unwrap()
            .get(&(subject.to_string(), catalog_number.to_string()))
            .cloned();
        match reply {
            Some(Reply::Records(records)) => Ok(records),
            Some(Reply::Fail(error)) => Err(error),
            None => Ok(Vec::new()),
        }
    }
}

pub async fn memory_store() -> ScheduleStore {
    open_in_memory(TERM).await.expect("in-memory store")
}

pub fn cache(store: ScheduleStore, catalog: Arc<MockCatalog>, ttl: Duration) -> CatalogCache {
    CatalogCache::new(store, catalog, ttl, Duration::from_secs(1))
}

pub async fn queries(catalog: Arc<MockCatalog>) -> CourseQueries {
    CourseQueries::new(cache(memory_store().await, catalog, Duration::from_secs(3600)))
}

fn weekly(weekdays: &str, start: &str, end: &str, building: &str, room: &str, instructors: &[&str]) -> Value {
    json!({
        "date": {
            "start_time": start, "end_time": end, "weekdays": weekdays,
            "start_date": null, "end_date": null,
            "is_tba": false, "is_cancelled": false, "is_closed": false
        },
        "location": { "building": building, "room": room },
        "instructors": instructors
    })
}

/// CS 135 in term 1159: one lecture in association group 1 and two
/// tutorials, only one of which shares the lecture's group.
pub fn cs135() -> Value {
    json!([
        {
            "subject": "CS",
            "catalog_number": "135",
            "title": "Designing Functional Programs",
            "academic_level": "undergraduate",
            "units": 0.5,
            "class_number": 5001,
            "section": "LEC 001",
            "associated_class": 1,
            "related_component_1": "99",
            "related_component_2": "None",
            "campus": "UW U",
            "enrollment_total": 80,
            "enrollment_capacity": 90,
            "reserves": [
                { "reserve_group": "Year 1 Math Students", "enrollment_total": 20, "enrollment_capacity": 25 }
            ],
            "classes": [
                weekly("MWF", "08:30", "09:20", "MC", "2065", &["Smith,John"]),
                weekly("TTh", "10:00", "11:20", "MC", "2065", &["Smith,John", "Doe,Jane"]),
                {
                    "date": {
                        "start_time": "19:00", "end_time": "20:50", "weekdays": "T",
                        "start_date": "10/20", "end_date": "10/20",
                        "is_tba": false, "is_cancelled": false, "is_closed": false
                    },
                    "location": { "building": "PAC", "room": null },
                    "instructors": []
                }
            ]
        },
        {
            "class_number": 5002,
            "section": "TUT 101",
            "associated_class": 1,
            "classes": [weekly("F", "13:30", "14:20", "MC", "4059", &["Lee,Ann"])]
        },
        {
            "class_number": 5003,
            "section": "TUT 102",
            "associated_class": 2,
            "classes": [weekly("F", "14:30", "15:20", "MC", "4059", &["Lee,Ann"])]
        }
    ])
}

/// `count` open tutorials under one lecture, all tagged with `tag` in the
/// title so readers can tell snapshots apart.
pub fn tagged_course(tag: &str, count: usize) -> Value {
    let mut records = vec![json!({
        "title": tag,
        "section": "LEC 001",
        "associated_class": 1
    })];
    for i in 0..count {
        records.push(json!({
            "title": tag,
            "section": format!("TUT {}", 101 + i),
            "associated_class": 1,
            "campus": tag
        }));
    }
    Value::Array(records)
}
