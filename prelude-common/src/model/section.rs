//! Editor navigation cursor

use serde::{Deserialize, Serialize};

use super::enums::ProjectType;

/// Part of the editing surface currently shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Section {
    #[default]
    Overview,
    Personnel,
    Venue,
    Instrumentation,
    TrackList,
    MicrophonePlan,
    InputList,
    Preamps,
    Equipment,
    SetupNotes,
    AtmosConfig,
    Timeline,
    Sessions,
}

impl Section {
    pub const ALL: [Section; 13] = [
        Section::Overview,
        Section::Personnel,
        Section::Venue,
        Section::Instrumentation,
        Section::TrackList,
        Section::MicrophonePlan,
        Section::InputList,
        Section::Preamps,
        Section::Equipment,
        Section::SetupNotes,
        Section::AtmosConfig,
        Section::Timeline,
        Section::Sessions,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Section::Overview => "Project Overview",
            Section::Personnel => "Personnel",
            Section::Venue => "Venue",
            Section::Instrumentation => "Instrumentation",
            Section::TrackList => "Track List",
            Section::MicrophonePlan => "Microphone Plan",
            Section::InputList => "Input List",
            Section::Preamps => "Preamps",
            Section::Equipment => "Equipment",
            Section::SetupNotes => "Setup Notes",
            Section::AtmosConfig => "Atmos Configuration",
            Section::Timeline => "Timeline",
            Section::Sessions => "Session Schedule",
        }
    }

    pub fn is_visible_for(&self, project_type: ProjectType) -> bool {
        match self {
            Section::AtmosConfig => project_type.is_atmos(),
            _ => true,
        }
    }

    /// Sections shown for a project of the given type, in navigation order
    pub fn visible(project_type: ProjectType) -> Vec<Section> {
        Self::ALL
            .into_iter()
            .filter(|s| s.is_visible_for(project_type))
            .collect()
    }

    pub fn next(&self, project_type: ProjectType) -> Option<Section> {
        let visible = Self::visible(project_type);
        let pos = visible.iter().position(|s| s == self)?;
        visible.get(pos + 1).copied()
    }

    pub fn previous(&self, project_type: ProjectType) -> Option<Section> {
        let visible = Self::visible(project_type);
        let pos = visible.iter().position(|s| s == self)?;
        pos.checked_sub(1).and_then(|p| visible.get(p).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atmos_section_hidden_for_band() {
        assert_eq!(Section::SetupNotes.next(ProjectType::Band), Some(Section::Timeline));
        assert_eq!(Section::Timeline.previous(ProjectType::Band), Some(Section::SetupNotes));
    }

    #[test]
    fn test_atmos_section_shown_for_atmos() {
        assert_eq!(Section::SetupNotes.next(ProjectType::Atmos), Some(Section::AtmosConfig));
        assert_eq!(Section::Timeline.previous(ProjectType::Atmos), Some(Section::AtmosConfig));
    }

    #[test]
    fn test_navigation_bounds() {
        assert_eq!(Section::Overview.previous(ProjectType::Other), None);
        assert_eq!(Section::Sessions.next(ProjectType::Other), None);
        assert_eq!(Section::default(), Section::Overview);
    }
}
