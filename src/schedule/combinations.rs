use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::models::{AssociatedClass, CourseSnapshot, SectionEntry};

use super::grouping::group_open_sections;

/// Sections of the other components that may be taken together with
/// `selected_label`.
///
/// The first group is always `[selected_label]`; the remaining groups follow
/// the open component order. An unknown label yields an empty list.
pub fn related_sections(snapshot: &CourseSnapshot, selected_label: &str) -> Vec<Vec<String>> {
    let Some(selected) = snapshot.section(selected_label) else {
        return Vec::new();
    };

    let open_groups = group_open_sections(&snapshot.sections);
    let own_component = selected.section.component();
    let by_label: HashMap<&str, &SectionEntry> = snapshot
        .sections
        .iter()
        .map(|entry| (entry.label(), entry))
        .collect();

    let mut related: Vec<(&str, Vec<String>)> = open_groups
        .iter()
        .filter(|g| g.component != own_component)
        .map(|g| (g.component.as_str(), Vec::new()))
        .collect();

    // Explicit pairings make their component mandatory, even when the paired
    // section is closed.
    let mut mandatory: HashSet<&str> = HashSet::new();
    for slot in selected.section.related_components() {
        let Some(ordinal) = slot.ordinal() else {
            continue;
        };
        let Some(target) = resolve_ordinal(snapshot, ordinal) else {
            warn!(
                "{} {}: related component {} matches no section",
                snapshot.course.subject, selected_label, ordinal
            );
            continue;
        };

        let component = target.section.component();
        mandatory.insert(component);
        if !target.is_open() {
            continue;
        }
        if let Some((_, labels)) = related.iter_mut().find(|(c, _)| *c == component) {
            if !labels.iter().any(|l| l == target.label()) {
                labels.push(target.label().to_string());
            }
        }
    }

    let association = selected.section.associated_class;
    for (component, labels) in related.iter_mut() {
        if !labels.is_empty() || mandatory.contains(*component) {
            continue;
        }
        let Some(group) = open_groups.iter().find(|g| g.component == *component) else {
            continue;
        };
        let open_in_component: Vec<&SectionEntry> = group
            .labels
            .iter()
            .filter_map(|label| by_label.get(label.as_str()).copied())
            .collect();

        let mut candidates: Vec<String> = match association {
            AssociatedClass::Group(_) => open_in_component
                .iter()
                .filter(|entry| entry.section.associated_class == association)
                .map(|entry| entry.label().to_string())
                .collect(),
            AssociatedClass::Unassociated => Vec::new(),
        };

        if candidates.is_empty() {
            candidates = open_in_component
                .iter()
                .filter(|entry| entry.section.associated_class == AssociatedClass::Unassociated)
                .map(|entry| entry.label().to_string())
                .collect();
        }

        *labels = candidates;
    }

    let mut result = vec![vec![selected_label.to_string()]];
    result.extend(
        related
            .into_iter()
            .map(|(_, labels)| labels)
            .filter(|labels| !labels.is_empty()),
    );
    result
}

/// The lexicographically first section whose label contains `ordinal`.
fn resolve_ordinal<'a>(snapshot: &'a CourseSnapshot, ordinal: &str) -> Option<&'a SectionEntry> {
    snapshot
        .sections
        .iter()
        .filter(|entry| entry.label().contains(ordinal))
        .min_by(|a, b| a.label().cmp(b.label()))
}
