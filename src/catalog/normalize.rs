use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::models::{
    AssociatedClass, Course, CourseKey, CourseSnapshot, Meeting, RelatedComponent, Reserve,
    Section, SectionEntry,
};
use crate::schedule::decode_weekdays;

use super::dto::{RawClass, RawReserve, RawSection};

/// Wire value the catalog uses for "no association".
const UNASSOCIATED_CODE: i64 = 99;

/// Builds the snapshot to store for `key` from raw catalog records.
///
/// Missing or unparsable fields fall back to defaults. Records without a
/// section label cannot be keyed and are dropped. Returns `None` when no
/// record survives.
pub fn into_snapshot(
    key: &CourseKey,
    records: Vec<RawSection>,
    synced_at: DateTime<Utc>,
) -> Option<CourseSnapshot> {
    let header = records.first()?.clone();
    let year = year_of_term(key.term);

    let mut seen = HashSet::new();
    let mut sections = Vec::with_capacity(records.len());
    for raw in records {
        let Some(label) = raw
            .section
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
        else {
            warn!("{}: dropping catalog record without a section label", key);
            continue;
        };
        if !seen.insert(label.clone()) {
            warn!("{}: duplicate section {} in catalog response", key, label);
            continue;
        }
        sections.push(section_entry(key, label, raw, year));
    }

    if sections.is_empty() {
        return None;
    }
    sections.sort_by(|a, b| a.section.label.cmp(&b.section.label));

    let course = Course {
        term: key.term,
        subject: key.subject.clone(),
        catalog_number: key.catalog_number.clone(),
        title: header.title.unwrap_or_default(),
        topic: header.topic,
        note: header.note,
        academic_level: header.academic_level.unwrap_or_default(),
        units: header.units.unwrap_or(0.0),
        last_updated: header.last_updated,
        last_synced_at: synced_at,
        snapshot_id: Uuid::new_v4().to_string(),
    };

    Some(CourseSnapshot { course, sections })
}

fn section_entry(key: &CourseKey, label: String, raw: RawSection, year: i32) -> SectionEntry {
    let associated_class = parse_associated_class(key, &label, raw.associated_class.as_ref());
    let related_component_1 = parse_related_component(key, &label, raw.related_component_1.as_ref());
    let related_component_2 = parse_related_component(key, &label, raw.related_component_2.as_ref());

    let reserves = raw.reserves.into_iter().map(reserve).collect();
    let meetings = raw
        .classes
        .into_iter()
        .map(|class| meeting(key, &label, class, year))
        .collect();

    SectionEntry {
        section: Section {
            class_number: raw.class_number.unwrap_or(0),
            label,
            associated_class,
            related_component_1,
            related_component_2,
            campus: raw.campus.unwrap_or_default(),
            enrollment_total: raw.enrollment_total.unwrap_or(0),
            enrollment_capacity: raw.enrollment_capacity.unwrap_or(0),
            waiting_total: raw.waiting_total.unwrap_or(0),
            waiting_capacity: raw.waiting_capacity.unwrap_or(0),
            held_with: raw.held_with,
        },
        reserves,
        meetings,
    }
}

fn reserve(raw: RawReserve) -> Reserve {
    Reserve {
        group: raw.reserve_group,
        reserved_total: raw.enrollment_total.unwrap_or(0),
        reserved_capacity: raw.enrollment_capacity.unwrap_or(0),
    }
}

fn meeting(key: &CourseKey, label: &str, raw: RawClass, year: i32) -> Meeting {
    let date = raw.date;
    Meeting {
        is_tba: date.is_tba,
        is_cancelled: date.is_cancelled,
        is_closed: date.is_closed,
        start_date: parse_date(key, label, date.start_date.as_deref(), year),
        end_date: parse_date(key, label, date.end_date.as_deref(), year),
        start_time: parse_time(key, label, date.start_time.as_deref()),
        end_time: parse_time(key, label, date.end_time.as_deref()),
        weekdays: date
            .weekdays
            .as_deref()
            .map(decode_weekdays)
            .unwrap_or_default(),
        instructors: raw.instructors,
        building: raw.location.building,
        room: raw.location.room,
    }
}

fn parse_associated_class(key: &CourseKey, label: &str, value: Option<&Value>) -> AssociatedClass {
    let parsed = match value {
        None | Some(Value::Null) => return AssociatedClass::Unassociated,
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => match s.trim() {
            "" | "None" => return AssociatedClass::Unassociated,
            other => other.parse::<i64>().ok(),
        },
        Some(_) => None,
    };

    match parsed {
        Some(UNASSOCIATED_CODE) => AssociatedClass::Unassociated,
        Some(group) => AssociatedClass::Group(group),
        None => {
            warn!("{} {}: unreadable associated_class {:?}", key, label, value);
            AssociatedClass::Unassociated
        }
    }
}

fn parse_related_component(key: &CourseKey, label: &str, value: Option<&Value>) -> RelatedComponent {
    let ordinal = match value {
        None | Some(Value::Null) => return RelatedComponent::Unassociated,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => {
            warn!("{} {}: unreadable related component {}", key, label, other);
            return RelatedComponent::Unassociated;
        }
    };

    match ordinal.as_str() {
        "" | "None" | "99" => RelatedComponent::Unassociated,
        _ => RelatedComponent::Ordinal(ordinal),
    }
}

/// Term codes are `1YYM`: 1159 is September 2015.
pub fn year_of_term(term: u32) -> i32 {
    2000 + ((term % 1000) / 10) as i32
}

fn parse_date(key: &CourseKey, label: &str, value: Option<&str>, year: i32) -> Option<NaiveDate> {
    let value = value.map(str::trim).filter(|v| !v.is_empty())?;
    let parsed = value.split_once('/').and_then(|(month, day)| {
        NaiveDate::from_ymd_opt(year, month.trim().parse().ok()?, day.trim().parse().ok()?)
    });
    if parsed.is_none() {
        warn!("{} {}: unreadable meeting date {:?}", key, label, value);
    }
    parsed
}

fn parse_time(key: &CourseKey, label: &str, value: Option<&str>) -> Option<NaiveTime> {
    let value = value.map(str::trim).filter(|v| !v.is_empty())?;
    match NaiveTime::parse_from_str(value, "%H:%M") {
        Ok(time) => Some(time),
        Err(e) => {
            warn!("{} {}: unreadable meeting time {:?}: {}", key, label, value, e);
            None
        }
    }
}
