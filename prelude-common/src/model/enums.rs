//! Closed enumerations used by the project document
//!
//! Each enumeration serializes to the exact string stored in project payloads
//! and exposes a display label for exports and UI.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of production a project plans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProjectType {
    Band,
    Classical,
    LargeJazz,
    SmallJazz,
    HipHopElectronic,
    SingerSongwriter,
    /// Dolby Atmos production; the only type that carries an atmos config
    Atmos,
    #[default]
    Other,
}

impl ProjectType {
    pub const ALL: [ProjectType; 8] = [
        ProjectType::Band,
        ProjectType::Classical,
        ProjectType::LargeJazz,
        ProjectType::SmallJazz,
        ProjectType::HipHopElectronic,
        ProjectType::SingerSongwriter,
        ProjectType::Atmos,
        ProjectType::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ProjectType::Band => "Band Recording",
            ProjectType::Classical => "Classical/Orchestral",
            ProjectType::LargeJazz => "Large Jazz Ensemble",
            ProjectType::SmallJazz => "Small Jazz Ensemble",
            ProjectType::HipHopElectronic => "Hip Hop & Electronic",
            ProjectType::SingerSongwriter => "Singer-Songwriter / Acoustic",
            ProjectType::Atmos => "Dolby Atmos",
            ProjectType::Other => "Other",
        }
    }

    pub fn is_atmos(&self) -> bool {
        matches!(self, ProjectType::Atmos)
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Kind of work booked for a session day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionType {
    #[default]
    Recording,
    Mixing,
    Mastering,
    Other,
}

impl SessionType {
    pub fn label(&self) -> &'static str {
        match self {
            SessionType::Recording => "Recording",
            SessionType::Mixing => "Mixing",
            SessionType::Mastering => "Mastering",
            SessionType::Other => "Other",
        }
    }
}

/// Channel layout of an input-list entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrackFormat {
    #[default]
    Mono,
    Stereo,
}

impl TrackFormat {
    pub fn label(&self) -> &'static str {
        match self {
            TrackFormat::Mono => "Mono",
            TrackFormat::Stereo => "Stereo",
        }
    }

    /// Number of audio channels the format occupies
    pub fn channel_count(&self) -> u32 {
        match self {
            TrackFormat::Mono => 1,
            TrackFormat::Stereo => 2,
        }
    }
}

/// Fixed track color palette; `None` is stored as the empty string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrackColor {
    #[default]
    #[serde(rename = "")]
    None,
    Red,
    Orange,
    Yellow,
    Green,
    Cyan,
    Blue,
    Purple,
    Pink,
}

impl TrackColor {
    /// Stored name ("" for no color)
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackColor::None => "",
            TrackColor::Red => "red",
            TrackColor::Orange => "orange",
            TrackColor::Yellow => "yellow",
            TrackColor::Green => "green",
            TrackColor::Cyan => "cyan",
            TrackColor::Blue => "blue",
            TrackColor::Purple => "purple",
            TrackColor::Pink => "pink",
        }
    }

    pub fn is_set(&self) -> bool {
        !matches!(self, TrackColor::None)
    }
}

/// Atmos track role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AtmosTrackType {
    Bed,
    #[default]
    Object,
}

impl AtmosTrackType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AtmosTrackType::Bed => "bed",
            AtmosTrackType::Object => "object",
        }
    }
}

/// Speaker height layer for an atmos track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HeightLayer {
    Floor,
    Mid,
    Overhead,
}

impl HeightLayer {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeightLayer::Floor => "floor",
            HeightLayer::Mid => "mid",
            HeightLayer::Overhead => "overhead",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_type_wire_names() {
        assert_eq!(serde_json::to_string(&ProjectType::LargeJazz).unwrap(), "\"largeJazz\"");
        assert_eq!(
            serde_json::to_string(&ProjectType::HipHopElectronic).unwrap(),
            "\"hipHopElectronic\""
        );
        let parsed: ProjectType = serde_json::from_str("\"singerSongwriter\"").unwrap();
        assert_eq!(parsed, ProjectType::SingerSongwriter);
    }

    #[test]
    fn test_every_project_type_has_label() {
        for ty in ProjectType::ALL {
            assert!(!ty.label().is_empty());
        }
        assert_eq!(ProjectType::Atmos.to_string(), "Dolby Atmos");
    }

    #[test]
    fn test_track_color_none_is_empty_string() {
        assert_eq!(serde_json::to_string(&TrackColor::None).unwrap(), "\"\"");
        let parsed: TrackColor = serde_json::from_str("\"\"").unwrap();
        assert_eq!(parsed, TrackColor::None);
        let parsed: TrackColor = serde_json::from_str("\"purple\"").unwrap();
        assert_eq!(parsed, TrackColor::Purple);
    }

    #[test]
    fn test_unknown_enum_value_rejected() {
        assert!(serde_json::from_str::<SessionType>("\"rehearsal\"").is_err());
    }

    #[test]
    fn test_stereo_uses_two_channels() {
        assert_eq!(TrackFormat::Mono.channel_count(), 1);
        assert_eq!(TrackFormat::Stereo.channel_count(), 2);
    }
}
