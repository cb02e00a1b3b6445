use std::collections::BTreeSet;

use chrono::{TimeZone, Utc};

use crate::models::{
    AssociatedClass, Course, CourseSnapshot, Meeting, RelatedComponent, Section, SectionEntry,
};

pub fn meeting() -> Meeting {
    Meeting {
        is_tba: false,
        is_cancelled: false,
        is_closed: false,
        start_date: None,
        end_date: None,
        start_time: None,
        end_time: None,
        weekdays: BTreeSet::new(),
        instructors: Vec::new(),
        building: None,
        room: None,
    }
}

pub fn section(label: &str, associated_class: AssociatedClass) -> SectionEntry {
    SectionEntry {
        section: Section {
            class_number: 0,
            label: label.to_string(),
            associated_class,
            related_component_1: RelatedComponent::Unassociated,
            related_component_2: RelatedComponent::Unassociated,
            campus: "UW U".to_string(),
            enrollment_total: 0,
            enrollment_capacity: 0,
            waiting_total: 0,
            waiting_capacity: 0,
            held_with: Vec::new(),
        },
        reserves: Vec::new(),
        meetings: vec![meeting()],
    }
}

pub fn open(label: &str, associated_class: AssociatedClass) -> SectionEntry {
    section(label, associated_class)
}

pub fn closed(label: &str, associated_class: AssociatedClass) -> SectionEntry {
    let mut entry = section(label, associated_class);
    entry.meetings[0].is_closed = true;
    entry
}

pub fn related(mut entry: SectionEntry, first: Option<&str>, second: Option<&str>) -> SectionEntry {
    entry.section.related_component_1 = first.map(str::to_string).into();
    entry.section.related_component_2 = second.map(str::to_string).into();
    entry
}

pub fn snapshot(mut sections: Vec<SectionEntry>) -> CourseSnapshot {
    sections.sort_by(|a, b| a.section.label.cmp(&b.section.label));
    CourseSnapshot {
        course: Course {
            term: 1159,
            subject: "CS".to_string(),
            catalog_number: "135".to_string(),
            title: "Designing Functional Programs".to_string(),
            topic: None,
            note: None,
            academic_level: "undergraduate".to_string(),
            units: 0.5,
            last_updated: None,
            last_synced_at: Utc.with_ymd_and_hms(2015, 9, 1, 12, 0, 0).unwrap(),
            snapshot_id: "fixture".to_string(),
        },
        sections,
    }
}
