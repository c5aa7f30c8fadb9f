//! Project document sections and the entities stored in their lists
//!
//! Every struct defaults missing fields so older payloads (and payloads
//! written by newer clients with extra fields) still load.

use serde::{Deserialize, Deserializer, Serialize};

use crate::uuid_utils;

use super::enums::{AtmosTrackType, HeightLayer, ProjectType, SessionType, TrackColor, TrackFormat};

/// An element of an ordered sub-collection, addressed by a stable id
pub trait Entity {
    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);

    /// Give nested entities fresh ids; called when the parent is added
    fn regenerate_child_ids(&mut self) {}
}

macro_rules! impl_entity {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Entity for $ty {
                fn id(&self) -> &str {
                    &self.id
                }

                fn set_id(&mut self, id: String) {
                    self.id = id;
                }
            }
        )*
    };
}

impl_entity!(
    Personnel,
    VenueImage,
    Instrumentation,
    Track,
    MicrophonePlanItem,
    InputListItem,
    EquipmentItem,
    Preamp,
    SetupDiagram,
    AtmosTrack,
    TimelinePhase,
    ScheduleBlock,
);

impl Entity for Session {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn regenerate_child_ids(&mut self) {
        for block in &mut self.schedule {
            block.id = uuid_utils::new_id();
        }
    }
}

fn default_quantity() -> u32 {
    1
}

/// Accept `"3"`, `"3-4"` or a bare JSON number (older payloads stored ints)
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(f) => f.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectOverview {
    pub name: String,
    pub client: String,
    /// Rich text (HTML markup)
    pub description: String,
    pub project_type: ProjectType,
    pub start_date: String,
    pub end_date: String,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Personnel {
    pub id: String,
    pub name: String,
    pub roles: Vec<String>,
    pub instrument: String,
    pub contact: String,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VenueImage {
    pub id: String,
    pub url: String,
    pub caption: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Venue {
    pub name: String,
    pub address: String,
    pub room_name: String,
    pub dimensions: String,
    /// Rich text (HTML markup)
    pub acoustic_notes: String,
    pub contact_person: String,
    pub contact_phone: String,
    pub images: Vec<VenueImage>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Instrumentation {
    pub id: String,
    pub instrument: String,
    /// Free-text performer kept for payloads written before `performer_ids`
    pub performer: String,
    /// References to `Personnel::id`
    pub performer_ids: Vec<String>,
    /// Manually typed track name; linked tracks take precedence on export
    pub track_name: String,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Track {
    pub id: String,
    /// User-editable; neither unique nor gapless
    pub track_number: i64,
    pub title: String,
    pub duration: String,
    /// References to `Personnel::id`
    pub personnel: Vec<String>,
    /// References to `Instrumentation::id`
    pub instruments: Vec<String>,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MicrophonePlanItem {
    pub id: String,
    pub source: String,
    pub microphone: String,
    pub quantity: u32,
    pub position: String,
    pub notes: String,
}

impl Default for MicrophonePlanItem {
    fn default() -> Self {
        Self {
            id: String::new(),
            source: String::new(),
            microphone: String::new(),
            quantity: default_quantity(),
            position: String::new(),
            notes: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InputListItem {
    pub id: String,
    /// Console channel, `"5"` for mono or `"5-6"` for a stereo pair
    #[serde(deserialize_with = "string_or_number")]
    pub channel: String,
    pub source: String,
    pub microphone: String,
    /// One of the strings produced by [`Preamp::channel_options`]
    pub preamp: String,
    pub track_format: TrackFormat,
    pub track_color: TrackColor,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EquipmentItem {
    pub id: String,
    pub category: String,
    pub item: String,
    pub quantity: u32,
    pub serial_number: String,
    pub notes: String,
}

impl Default for EquipmentItem {
    fn default() -> Self {
        Self {
            id: String::new(),
            category: String::new(),
            item: String::new(),
            quantity: default_quantity(),
            serial_number: String::new(),
            notes: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preamp {
    pub id: String,
    pub name: String,
    pub model: String,
    pub channels: u32,
    pub notes: String,
}

impl Default for Preamp {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            model: String::new(),
            channels: default_quantity(),
            notes: String::new(),
        }
    }
}

impl Preamp {
    /// Display strings an input-list entry can reference, one per channel
    pub fn channel_options(&self) -> Vec<String> {
        let unit = match (self.name.trim(), self.model.trim()) {
            ("", "") => "Preamp".to_string(),
            (name, "") => name.to_string(),
            ("", model) => model.to_string(),
            (name, model) => format!("{} {}", name, model),
        };
        (1..=self.channels)
            .map(|ch| format!("{} Ch {}", unit, ch))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SetupDiagram {
    pub id: String,
    pub url: String,
    pub caption: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SetupNotes {
    /// Rich text (HTML markup)
    pub description: String,
    pub diagrams: Vec<SetupDiagram>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AtmosTrack {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub track_type: AtmosTrackType,
    pub bed_assignment: String,
    pub object_behavior: String,
    pub height_layer: Option<HeightLayer>,
    pub notes: String,
}

/// Default bed layout for new Atmos projects
pub const DEFAULT_BED_FORMAT: &str = "7.1.4";

/// Renderer object limit for new Atmos projects
pub const DEFAULT_MAX_OBJECTS: u32 = 118;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AtmosConfig {
    pub renderer_type: String,
    pub bed_format: String,
    pub max_objects: u32,
    pub deliverables: String,
    /// Rich text (HTML markup)
    pub notes: String,
    pub tracks: Vec<AtmosTrack>,
}

impl Default for AtmosConfig {
    fn default() -> Self {
        Self {
            renderer_type: String::new(),
            bed_format: DEFAULT_BED_FORMAT.to_string(),
            max_objects: DEFAULT_MAX_OBJECTS,
            deliverables: String::new(),
            notes: String::new(),
            tracks: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimelinePhase {
    pub id: String,
    pub phase: String,
    pub description: String,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScheduleBlock {
    pub id: String,
    pub start_hour: String,
    pub end_hour: String,
    pub activity: String,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Session {
    pub id: String,
    pub date: String,
    #[serde(rename = "type")]
    pub session_type: SessionType,
    pub venue: String,
    pub start_time: String,
    pub end_time: String,
    pub schedule: Vec<ScheduleBlock>,
}

/// Highest channel number a channel label occupies ("3-4" → 4)
fn channel_upper_bound(channel: &str) -> Option<u32> {
    channel
        .split('-')
        .filter_map(|part| part.trim().parse::<u32>().ok())
        .max()
}

/// Channel label for a new input-list entry appended after `items`
///
/// Continues after the highest channel in use; stereo entries take a pair.
pub fn next_input_channel(items: &[InputListItem], format: TrackFormat) -> String {
    let start = items
        .iter()
        .filter_map(|item| channel_upper_bound(&item.channel))
        .max()
        .map_or(1, |max| max + 1);

    match format {
        TrackFormat::Mono => start.to_string(),
        TrackFormat::Stereo => format!("{}-{}", start, start + 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(channel: &str, format: TrackFormat) -> InputListItem {
        InputListItem {
            channel: channel.to_string(),
            track_format: format,
            ..Default::default()
        }
    }

    #[test]
    fn test_next_channel_after_two_mono_inputs_for_stereo() {
        let items = vec![input("1", TrackFormat::Mono), input("2", TrackFormat::Mono)];
        assert_eq!(next_input_channel(&items, TrackFormat::Stereo), "3-4");
    }

    #[test]
    fn test_next_channel_counts_stereo_upper_bound() {
        let items = vec![input("1-2", TrackFormat::Stereo)];
        assert_eq!(next_input_channel(&items, TrackFormat::Mono), "3");
    }

    #[test]
    fn test_next_channel_empty_list_starts_at_one() {
        assert_eq!(next_input_channel(&[], TrackFormat::Mono), "1");
        assert_eq!(next_input_channel(&[], TrackFormat::Stereo), "1-2");
    }

    #[test]
    fn test_next_channel_ignores_unparsable_labels() {
        let items = vec![input("talkback", TrackFormat::Mono), input("7", TrackFormat::Mono)];
        assert_eq!(next_input_channel(&items, TrackFormat::Mono), "8");
    }

    #[test]
    fn test_legacy_numeric_channel_accepted() {
        let item: InputListItem =
            serde_json::from_str(r#"{"id":"a","channel":5,"source":"Kick"}"#).unwrap();
        assert_eq!(item.channel, "5");
        assert_eq!(item.track_format, TrackFormat::Mono);
        assert_eq!(item.track_color, TrackColor::None);
    }

    #[test]
    fn test_preamp_channel_options() {
        let preamp = Preamp {
            name: "Neve".to_string(),
            model: "1073".to_string(),
            channels: 2,
            ..Default::default()
        };
        assert_eq!(preamp.channel_options(), vec!["Neve 1073 Ch 1", "Neve 1073 Ch 2"]);
    }

    #[test]
    fn test_atmos_track_type_field_name() {
        let track = AtmosTrack {
            track_type: AtmosTrackType::Bed,
            ..Default::default()
        };
        let json = serde_json::to_value(&track).unwrap();
        assert_eq!(json["type"], "bed");
    }

    #[test]
    fn test_missing_quantity_defaults_to_one() {
        let item: EquipmentItem = serde_json::from_str(r#"{"id":"e","item":"SM57"}"#).unwrap();
        assert_eq!(item.quantity, 1);
    }
}
