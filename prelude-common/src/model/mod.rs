//! Project document model
//!
//! One [`Project`] is a complete pre-production plan. Nested data lives in
//! the document itself; there are no rows for sub-entities.

pub mod entities;
pub mod enums;
pub mod section;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use entities::*;
pub use enums::*;
pub use section::Section;

/// Root aggregate for one production plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default)]
    pub id: String,
    #[serde(default = "crate::time::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "crate::time::now")]
    pub updated_at: DateTime<Utc>,
    pub overview: ProjectOverview,
    #[serde(default)]
    pub personnel: Vec<Personnel>,
    #[serde(default)]
    pub venue: Venue,
    #[serde(default)]
    pub instrumentation: Vec<Instrumentation>,
    #[serde(default)]
    pub track_list: Vec<Track>,
    #[serde(default)]
    pub microphone_plan: Vec<MicrophonePlanItem>,
    #[serde(default)]
    pub input_list: Vec<InputListItem>,
    #[serde(default)]
    pub equipment: Vec<EquipmentItem>,
    #[serde(default)]
    pub preamps: Vec<Preamp>,
    #[serde(default)]
    pub setup_notes: SetupNotes,
    /// Present only for projects created as Dolby Atmos
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atmos_config: Option<AtmosConfig>,
    #[serde(default)]
    pub timeline: Vec<TimelinePhase>,
    #[serde(default)]
    pub sessions: Vec<Session>,
}

/// Build a fully-populated empty project
///
/// Only Atmos projects receive an [`AtmosConfig`]; its bed format and object
/// limit start at the renderer defaults.
pub fn create_empty_project(name: &str, project_type: ProjectType) -> Project {
    let now = crate::time::now();
    Project {
        id: crate::uuid_utils::new_id(),
        created_at: now,
        updated_at: now,
        overview: ProjectOverview {
            name: name.to_string(),
            project_type,
            ..Default::default()
        },
        personnel: Vec::new(),
        venue: Venue::default(),
        instrumentation: Vec::new(),
        track_list: Vec::new(),
        microphone_plan: Vec::new(),
        input_list: Vec::new(),
        equipment: Vec::new(),
        preamps: Vec::new(),
        setup_notes: SetupNotes::default(),
        atmos_config: project_type.is_atmos().then(AtmosConfig::default),
        timeline: Vec::new(),
        sessions: Vec::new(),
    }
}

impl Project {
    pub fn name(&self) -> &str {
        &self.overview.name
    }

    pub fn project_type(&self) -> ProjectType {
        self.overview.project_type
    }

    /// Decode a stored or imported payload
    ///
    /// Unknown fields are ignored and absent sub-collections default to empty.
    /// A payload without an `overview` object is structurally invalid.
    pub fn from_value(value: serde_json::Value) -> Result<Project> {
        let object = value
            .as_object()
            .ok_or_else(|| Error::Validation("project payload must be a JSON object".into()))?;

        match object.get("overview") {
            Some(serde_json::Value::Object(_)) => {}
            _ => return Err(Error::MissingData("project has no overview".into())),
        }

        serde_json::from_value(value).map_err(|e| Error::Validation(format!("invalid project: {}", e)))
    }

    /// Parse raw JSON text into a project
    pub fn from_json(raw: &str) -> Result<Project> {
        let value: serde_json::Value = serde_json::from_str(raw)
            .map_err(|e| Error::Validation(format!("not valid JSON: {}", e)))?;
        Self::from_value(value)
    }

    /// Pretty-printed canonical JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Look up a personnel entry by id
    pub fn person(&self, id: &str) -> Option<&Personnel> {
        self.personnel.iter().find(|p| p.id == id)
    }

    /// Look up an instrumentation entry by id
    pub fn instrument(&self, id: &str) -> Option<&Instrumentation> {
        self.instrumentation.iter().find(|i| i.id == id)
    }

    /// Tracks ordered by ascending track number (stable for equal numbers)
    pub fn tracks_sorted(&self) -> Vec<&Track> {
        let mut tracks: Vec<&Track> = self.track_list.iter().collect();
        tracks.sort_by_key(|t| t.track_number);
        tracks
    }

    /// Channel label a new input-list entry of `format` would receive
    pub fn next_input_channel(&self, format: TrackFormat) -> String {
        entities::next_input_channel(&self.input_list, format)
    }

    /// Every preamp channel string an input-list entry may reference
    pub fn preamp_channel_options(&self) -> Vec<String> {
        self.preamps.iter().flat_map(|p| p.channel_options()).collect()
    }
}
