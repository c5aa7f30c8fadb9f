//! Cross-reference resolution
//!
//! Turns id references into display strings once, so renderers never look
//! anything up themselves.

use prelude_common::model::{Instrumentation, Project};

/// Where an instrumentation entry's performer text comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PerformerSource<'a> {
    /// Names of the referenced personnel that still exist
    Linked(Vec<&'a str>),
    /// Free-text performer of payloads written before references existed
    Legacy(&'a str),
}

impl PerformerSource<'_> {
    pub fn display(&self) -> String {
        match self {
            PerformerSource::Linked(names) => names.join(", "),
            PerformerSource::Legacy(text) => text.to_string(),
        }
    }
}

/// Structured references win; the legacy field is used only when there are none
pub fn performer_source<'a>(project: &'a Project, inst: &'a Instrumentation) -> PerformerSource<'a> {
    if inst.performer_ids.is_empty() {
        PerformerSource::Legacy(&inst.performer)
    } else {
        PerformerSource::Linked(
            inst.performer_ids
                .iter()
                .filter_map(|id| project.person(id))
                .map(|p| p.name.as_str())
                .collect(),
        )
    }
}

pub fn performer_display(project: &Project, inst: &Instrumentation) -> String {
    performer_source(project, inst).display()
}

/// Titles of tracks claiming `instrument_id`, by ascending track number
pub fn linked_track_names<'a>(project: &'a Project, instrument_id: &str) -> Vec<&'a str> {
    project
        .tracks_sorted()
        .into_iter()
        .filter(|t| t.instruments.iter().any(|id| id == instrument_id))
        .map(|t| t.title.as_str())
        .filter(|title| !title.is_empty())
        .collect()
}

/// Track name shown for an instrument; linked tracks override the typed name
pub fn instrument_track_name(project: &Project, inst: &Instrumentation) -> String {
    let linked = linked_track_names(project, &inst.id);
    if linked.is_empty() {
        inst.track_name.clone()
    } else {
        linked.join(", ")
    }
}

/// Comma-joined names of the personnel ids that resolve
pub fn personnel_names(project: &Project, ids: &[String]) -> String {
    ids.iter()
        .filter_map(|id| project.person(id))
        .map(|p| p.name.as_str())
        .filter(|name| !name.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Comma-joined instrument names of the instrumentation ids that resolve
pub fn instrument_names(project: &Project, ids: &[String]) -> String {
    ids.iter()
        .filter_map(|id| project.instrument(id))
        .map(|i| i.instrument.as_str())
        .filter(|name| !name.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Equipment items of one category, in checklist form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquipmentGroup {
    pub category: String,
    pub label: String,
    pub items: Vec<String>,
}

/// Group equipment by category in first-seen order
///
/// An empty category counts as `other`. Items read `name (xN)` when N > 1.
pub fn equipment_groups(project: &Project) -> Vec<EquipmentGroup> {
    let mut groups: Vec<EquipmentGroup> = Vec::new();

    for item in &project.equipment {
        let category = if item.category.is_empty() {
            "other"
        } else {
            item.category.as_str()
        };

        let line = if item.quantity > 1 {
            format!("{} (x{})", item.item, item.quantity)
        } else {
            item.item.clone()
        };

        match groups.iter_mut().find(|g| g.category == category) {
            Some(group) => group.items.push(line),
            None => groups.push(EquipmentGroup {
                category: category.to_string(),
                label: capitalize(category),
                items: vec![line],
            }),
        }
    }

    groups
}

/// Upper-case the first character
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
