//! Partial updates
//!
//! Each patch mirrors its target's fields as `Option`s; applying one copies
//! only the `Some` fields and leaves the rest untouched.

use prelude_common::model::{
    AtmosConfig, AtmosTrack, AtmosTrackType, EquipmentItem, HeightLayer, InputListItem,
    Instrumentation, MicrophonePlanItem, Personnel, Preamp, ProjectOverview, ProjectType,
    ScheduleBlock, Session, SessionType, SetupDiagram, SetupNotes, TimelinePhase, Track,
    TrackColor, TrackFormat, Venue, VenueImage,
};
use serde::{Deserialize, Deserializer, Serialize};

/// Keep a present `null` as `Some(None)` so it can clear an optional field
fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Merge partial fields into `T`
pub trait Patch<T> {
    fn apply_to(self, target: &mut T);
}

macro_rules! patch {
    (
        $(#[$meta:meta])*
        $name:ident for $target:ty {
            $( $(#[$fmeta:meta])* $field:ident : $fty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase", default)]
        pub struct $name {
            $(
                $(#[$fmeta])*
                #[serde(skip_serializing_if = "Option::is_none")]
                pub $field: Option<$fty>,
            )*
        }

        impl Patch<$target> for $name {
            fn apply_to(self, target: &mut $target) {
                $(
                    if let Some(value) = self.$field {
                        target.$field = value;
                    }
                )*
            }
        }
    };
}

patch!(OverviewPatch for ProjectOverview {
    name: String,
    client: String,
    description: String,
    /// Changing the type does not add or remove the atmos configuration
    project_type: ProjectType,
    start_date: String,
    end_date: String,
    notes: String,
});

// Nested lists (venue images, setup diagrams, atmos tracks, schedule blocks)
// are edited only through their own list operations so every entry keeps a
// generated id.
patch!(VenuePatch for Venue {
    name: String,
    address: String,
    room_name: String,
    dimensions: String,
    acoustic_notes: String,
    contact_person: String,
    contact_phone: String,
});

patch!(SetupNotesPatch for SetupNotes {
    description: String,
});

patch!(AtmosConfigPatch for AtmosConfig {
    renderer_type: String,
    bed_format: String,
    max_objects: u32,
    deliverables: String,
    notes: String,
});

patch!(PersonnelPatch for Personnel {
    name: String,
    roles: Vec<String>,
    instrument: String,
    contact: String,
    notes: String,
});

patch!(VenueImagePatch for VenueImage {
    url: String,
    caption: String,
});

patch!(InstrumentationPatch for Instrumentation {
    instrument: String,
    performer: String,
    performer_ids: Vec<String>,
    track_name: String,
    notes: String,
});

patch!(TrackPatch for Track {
    track_number: i64,
    title: String,
    duration: String,
    personnel: Vec<String>,
    instruments: Vec<String>,
    notes: String,
});

patch!(MicrophonePlanPatch for MicrophonePlanItem {
    source: String,
    microphone: String,
    quantity: u32,
    position: String,
    notes: String,
});

patch!(InputListPatch for InputListItem {
    channel: String,
    source: String,
    microphone: String,
    preamp: String,
    track_format: TrackFormat,
    track_color: TrackColor,
    notes: String,
});

patch!(EquipmentPatch for EquipmentItem {
    category: String,
    item: String,
    quantity: u32,
    serial_number: String,
    notes: String,
});

patch!(PreampPatch for Preamp {
    name: String,
    model: String,
    channels: u32,
    notes: String,
});

patch!(SetupDiagramPatch for SetupDiagram {
    url: String,
    caption: String,
});

patch!(AtmosTrackPatch for AtmosTrack {
    name: String,
    #[serde(rename = "type")]
    track_type: AtmosTrackType,
    bed_assignment: String,
    object_behavior: String,
    /// `null` clears the layer
    #[serde(deserialize_with = "explicit_null")]
    height_layer: Option<HeightLayer>,
    notes: String,
});

patch!(TimelinePatch for TimelinePhase {
    phase: String,
    description: String,
    start_date: String,
    end_date: String,
});

patch!(SessionPatch for Session {
    date: String,
    #[serde(rename = "type")]
    session_type: SessionType,
    venue: String,
    start_time: String,
    end_time: String,
});

patch!(ScheduleBlockPatch for ScheduleBlock {
    start_hour: String,
    end_hour: String,
    activity: String,
    notes: String,
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_only_touches_some_fields() {
        let mut person = Personnel {
            id: "p1".into(),
            name: "Alice".into(),
            roles: vec!["Producer".into()],
            instrument: "Piano".into(),
            contact: "alice@example.com".into(),
            notes: String::new(),
        };
        let before = person.clone();

        PersonnelPatch {
            notes: Some("x".into()),
            ..Default::default()
        }
        .apply_to(&mut person);

        assert_eq!(person.notes, "x");
        assert_eq!(Personnel { notes: before.notes.clone(), ..person.clone() }, before);
    }

    #[test]
    fn test_patch_deserializes_partial_json() {
        let patch: AtmosTrackPatch = serde_json::from_str(r#"{"type":"bed","name":"L/R"}"#).unwrap();
        assert_eq!(patch.track_type, Some(AtmosTrackType::Bed));
        assert_eq!(patch.name.as_deref(), Some("L/R"));
        assert!(patch.notes.is_none());
    }
}
