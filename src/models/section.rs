use serde::{Deserialize, Serialize};

use super::meeting::Meeting;

/// Association group linking sections across components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociatedClass {
    Unassociated,
    Group(i64),
}

impl AssociatedClass {
    pub fn group(self) -> Option<i64> {
        match self {
            AssociatedClass::Unassociated => None,
            AssociatedClass::Group(group) => Some(group),
        }
    }
}

impl From<Option<i64>> for AssociatedClass {
    fn from(value: Option<i64>) -> Self {
        value.map_or(AssociatedClass::Unassociated, AssociatedClass::Group)
    }
}

/// Pointer to a specific ordinal (e.g. "101") of another component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelatedComponent {
    Unassociated,
    Ordinal(String),
}

impl RelatedComponent {
    pub fn ordinal(&self) -> Option<&str> {
        match self {
            RelatedComponent::Unassociated => None,
            RelatedComponent::Ordinal(ordinal) => Some(ordinal),
        }
    }
}

impl From<Option<String>> for RelatedComponent {
    fn from(value: Option<String>) -> Self {
        value.map_or(RelatedComponent::Unassociated, RelatedComponent::Ordinal)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub class_number: i64,
    /// Component code plus ordinal, e.g. "LEC 001".
    pub label: String,
    pub associated_class: AssociatedClass,
    pub related_component_1: RelatedComponent,
    pub related_component_2: RelatedComponent,
    pub campus: String,
    pub enrollment_total: i64,
    pub enrollment_capacity: i64,
    pub waiting_total: i64,
    pub waiting_capacity: i64,
    pub held_with: Vec<String>,
}

impl Section {
    /// Three-character component code ("LEC", "TUT", ...).
    pub fn component(&self) -> &str {
        component_of(&self.label)
    }

    pub fn related_components(&self) -> [&RelatedComponent; 2] {
        [&self.related_component_1, &self.related_component_2]
    }
}

pub fn component_of(label: &str) -> &str {
    label.get(..3).unwrap_or(label)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reserve {
    pub group: Option<String>,
    pub reserved_total: i64,
    pub reserved_capacity: i64,
}

/// A section together with the rows that belong to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionEntry {
    pub section: Section,
    pub reserves: Vec<Reserve>,
    pub meetings: Vec<Meeting>,
}

impl SectionEntry {
    pub fn label(&self) -> &str {
        &self.section.label
    }

    pub fn is_open(&self) -> bool {
        crate::schedule::is_open(&self.meetings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_of_label() {
        assert_eq!(component_of("LEC 001"), "LEC");
        assert_eq!(component_of("TU"), "TU");
    }

    #[test]
    fn test_sentinel_conversions() {
        assert_eq!(AssociatedClass::from(None), AssociatedClass::Unassociated);
        assert_eq!(AssociatedClass::from(Some(3)).group(), Some(3));
        assert_eq!(
            RelatedComponent::from(Some("101".to_string())).ordinal(),
            Some("101")
        );
        assert_eq!(RelatedComponent::from(None).ordinal(), None);
    }
}
