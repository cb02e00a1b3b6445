use serde::Serialize;

use crate::models::SectionEntry;

/// Open sections of one component, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentGroup {
    pub component: String,
    pub labels: Vec<String>,
}

/// Partitions sections (already ordered by label) into component groups.
///
/// Groups keep the order in which each component first appears, only open
/// sections are kept, and groups left empty after filtering are dropped.
pub fn group_open_sections(sections: &[SectionEntry]) -> Vec<ComponentGroup> {
    let mut groups: Vec<ComponentGroup> = Vec::new();

    for entry in sections {
        let component = entry.section.component();
        let index = match groups.iter().position(|g| g.component == component) {
            Some(index) => index,
            None => {
                groups.push(ComponentGroup {
                    component: component.to_string(),
                    labels: Vec::new(),
                });
                groups.len() - 1
            }
        };

        if entry.is_open() {
            groups[index].labels.push(entry.label().to_string());
        }
    }

    groups.retain(|g| !g.labels.is_empty());
    groups
}
