mod common;

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveTime};
use serde_json::json;

use common::{MockCatalog, cs135, queries};
use uwcourses::models::Location;
use uwcourses::services::SectionStatus;

fn labels(groups: &[&[&str]]) -> Vec<Vec<String>> {
    groups
        .iter()
        .map(|g| g.iter().map(|l| l.to_string()).collect())
        .collect()
}

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

#[tokio::test]
async fn test_cs135_related_sections() {
    let catalog = MockCatalog::new();
    catalog.set_records("CS", "135", cs135());
    let queries = queries(catalog.clone()).await;

    let related = queries.related_sections("CS", "135", "LEC 001").await.expect("related");
    assert_eq!(related, labels(&[&["LEC 001"], &["TUT 101"]]));

    let open = queries.open_sections("CS", "135").await.expect("open");
    assert_eq!(open, labels(&[&["LEC 001"], &["TUT 101", "TUT 102"]]));

    assert_eq!(catalog.calls(), 1);
}

#[tokio::test]
async fn test_section_details() {
    let catalog = MockCatalog::new();
    catalog.set_records("CS", "135", cs135());
    let queries = queries(catalog.clone()).await;

    assert!(queries.is_open("CS", "135", "TUT 101").await.expect("open"));
    assert!(!queries.is_open("CS", "135", "TUT 999").await.expect("unknown"));

    let schedule = queries.time_schedule("CS", "135", "LEC 001").await.expect("schedule");
    assert_eq!(schedule.weekly.len(), 2);
    assert_eq!(schedule.weekly[0].weekdays, BTreeSet::from([1, 3, 5]));
    assert_eq!(schedule.weekly[0].start_time, time(8, 30));
    assert_eq!(schedule.weekly[1].weekdays, BTreeSet::from([2, 4]));
    assert_eq!(schedule.weekly[1].end_time, time(11, 20));
    assert_eq!(schedule.one_time.len(), 1);
    assert_eq!(schedule.one_time[0].date, NaiveDate::from_ymd_opt(2015, 10, 20).unwrap());

    let instructors = queries.instructors("CS", "135", "LEC 001").await.expect("instructors");
    assert_eq!(instructors, vec!["Smith,John".to_string(), "Doe,Jane".to_string()]);

    let locations = queries.location("CS", "135", "LEC 001").await.expect("location");
    assert_eq!(
        locations,
        vec![
            Location {
                building: Some("MC".to_string()),
                room: Some("2065".to_string()),
            },
            Location {
                building: Some("PAC".to_string()),
                room: None,
            },
        ]
    );

    let reserves = queries.reserve_info("CS", "135", "LEC 001").await.expect("reserves");
    assert_eq!(reserves.len(), 1);
    assert_eq!(reserves[0].group.as_deref(), Some("Year 1 Math Students"));
    assert_eq!(reserves[0].reserved_total, 20);
    assert_eq!(reserves[0].reserved_capacity, 25);

    assert!(queries.reserve_info("CS", "135", "TUT 101").await.expect("none").is_empty());
    assert_eq!(catalog.calls(), 1);
}

#[tokio::test]
async fn test_course_and_scans() {
    let catalog = MockCatalog::new();
    catalog.set_records("CS", "135", cs135());
    let queries = queries(catalog).await;

    let course = queries.course("CS", "135").await.expect("course").expect("offered");
    assert_eq!(course.title, "Designing Functional Programs");
    assert_eq!(course.units, 0.5);

    let tutorials = queries.component_sections("CS", "135", "TUT").await.expect("tutorials");
    assert_eq!(
        tutorials,
        vec![
            SectionStatus { label: "TUT 101".to_string(), open: true },
            SectionStatus { label: "TUT 102".to_string(), open: true },
        ]
    );

    let group = queries.associated_sections("CS", "135", 1).await.expect("group");
    assert_eq!(group, vec!["LEC 001".to_string(), "TUT 101".to_string()]);
}

#[tokio::test]
async fn test_closed_sections_are_left_out() {
    let catalog = MockCatalog::new();
    catalog.set_records(
        "MATH",
        "137",
        json!([
            { "section": "LEC 001", "associated_class": 1 },
            { "section": "LEC 002", "associated_class": 2,
              "classes": [{ "date": { "is_cancelled": true } }] },
            { "section": "TUT 101", "associated_class": 99,
              "classes": [{ "date": { "is_closed": true } }] },
            { "section": "TUT 102", "associated_class": 99 },
            { "section": "TST 201", "associated_class": 99,
              "classes": [{ "date": { "is_tba": true } }] }
        ]),
    );
    let queries = queries(catalog).await;

    let open = queries.open_sections("MATH", "137").await.expect("open");
    assert_eq!(open, labels(&[&["LEC 001"], &["TUT 102"]]));
    for group in &open {
        for label in group {
            assert!(queries.is_open("MATH", "137", label).await.expect("open"));
        }
    }

    let lectures = queries.component_sections("MATH", "137", "LEC").await.expect("lectures");
    assert_eq!(
        lectures,
        vec![
            SectionStatus { label: "LEC 001".to_string(), open: true },
            SectionStatus { label: "LEC 002".to_string(), open: false },
        ]
    );

    let related = queries.related_sections("MATH", "137", "LEC 001").await.expect("related");
    assert_eq!(related, labels(&[&["LEC 001"], &["TUT 102"]]));
}

#[tokio::test]
async fn test_course_not_offered_reads_empty() {
    let catalog = MockCatalog::new();
    let queries = queries(catalog.clone()).await;

    assert!(queries.course("CS", "999").await.expect("course").is_none());
    assert!(queries.open_sections("CS", "999").await.expect("open").is_empty());
    assert!(!queries.is_open("CS", "999", "LEC 001").await.expect("is_open"));
    assert!(queries.related_sections("CS", "999", "LEC 001").await.expect("related").is_empty());
    assert!(queries.instructors("CS", "999", "LEC 001").await.expect("instructors").is_empty());
    let schedule = queries.time_schedule("CS", "999", "LEC 001").await.expect("schedule");
    assert!(schedule.weekly.is_empty() && schedule.one_time.is_empty());

    // Every query asks again since nothing was cached.
    assert_eq!(catalog.calls(), 6);
}

#[tokio::test]
async fn test_mistyped_catalog_fields_keep_the_course() {
    let catalog = MockCatalog::new();
    catalog.set_records(
        "CS",
        "136",
        json!([
            { "section": "LEC 001", "class_number": "5001", "units": "0.50", "associated_class": "1" },
            { "section": "TUT 101", "associated_class": 1, "enrollment_total": "full",
              "classes": [{ "date": { "is_closed": "false" }, "instructors": "Lee,Ann" }] }
        ]),
    );
    let queries = queries(catalog).await;

    let course = queries.course("CS", "136").await.expect("course").expect("offered");
    assert_eq!(course.units, 0.5);

    let related = queries.related_sections("CS", "136", "LEC 001").await.expect("related");
    assert_eq!(related, labels(&[&["LEC 001"], &["TUT 101"]]));
    assert!(queries.instructors("CS", "136", "TUT 101").await.expect("instructors").is_empty());
}
