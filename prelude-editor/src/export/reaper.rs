//! REAPER project template (.rpp)
//!
//! One track per input-list entry with name, color and channel count set.
//! Everything else is REAPER's stock project header.

use prelude_common::model::{Project, TrackColor, TrackFormat};
use uuid::Uuid;

use super::daw::track_name;

/// Native REAPER color value for a palette entry
pub fn peak_color(color: TrackColor) -> u32 {
    match color {
        TrackColor::None => 0,
        TrackColor::Red => 16843860,
        TrackColor::Orange => 16826468,
        TrackColor::Yellow => 16842700,
        TrackColor::Green => 6750054,
        TrackColor::Cyan => 10551200,
        TrackColor::Blue => 16744448,
        TrackColor::Purple => 16711884,
        TrackColor::Pink => 16761035,
    }
}

const SAMPLE_RATE: u32 = 48000;

fn escape(s: &str) -> String {
    s.replace('"', "\\\"")
}

fn random_guid() -> String {
    format!("{{{}}}", Uuid::new_v4().to_string().to_uppercase())
}

pub fn render(project: &Project) -> String {
    render_with_guids(project, random_guid)
}

/// Render with a caller-supplied GUID source
pub fn render_with_guids<F: FnMut() -> String>(project: &Project, mut guid: F) -> String {
    // Envelope GUIDs come first, then one pair per track
    let envelopes = format!(
        "  <MASTERPLAYSPEEDENV
    EGUID {}
    ACT 0 -1
    VIS 0 1 1
    LANEHEIGHT 0 0
    ARM 0
    DEFSHAPE 0 -1 -1
  >
  <TEMPOENVEX
    EGUID {}
    ACT 0 -1
    VIS 1 0 1
    LANEHEIGHT 0 0
    ARM 0
    DEFSHAPE 1 -1 -1
  >
",
        guid(),
        guid()
    );
    let mut tracks = Vec::with_capacity(project.input_list.len());
    for (index, item) in project.input_list.iter().enumerate() {
        let nchan = if item.track_format == TrackFormat::Stereo { 2 } else { 1 };
        let track_guid = guid();
        let track_id = guid();
        tracks.push(format!(
            "  <TRACK {track_guid}
    NAME \"{name}\"
    PEAKCOL {color}
    BEAT -1
    AUTOMODE 0
    VOLPAN 1 0 -1 -1 1
    MUTESOLO 0 0 0
    IPHASE 0
    PLAYOFFS 0 1
    ISBUS 0 0
    BUSCOMP 0 0 0 0 0
    SHOWINMIX 1 0.6667 0.5 1 0.5 0 0 0
    SEL 0
    REC 0 0 1 0 0 0 0 0
    VU 2
    TRACKHEIGHT 0 0 0 0 0 0
    INQ 0 0 0 0.5 100 0 0 100
    NCHAN {nchan}
    FX 1
    TRACKID {track_id}
    PERF 0
    MIDIOUT -1
    MAINSEND 1 0
  >
",
            name = escape(&track_name(item, index)),
            color = peak_color(item.track_color),
        ));
    }

    let mut out = String::new();
    out.push_str(HEADER);
    out.push_str(&format!("  SAMPLERATE {} 0 0\n", SAMPLE_RATE));
    out.push_str(MIDDLE);
    out.push_str(&envelopes);
    out.push_str(&tracks.join("\n"));
    out.push_str(">\n");
    out
}

const HEADER: &str = "<REAPER_PROJECT 0.1 \"7.0\" 1704067200
  RIPPLE 0
  GROUPOVERRIDE 0 0 0
  AUTOXFADE 1
  ENVATTACH 1
  POOLEDENVATTACH 0
  MIXERUIFLAGS 11 48
  PEAKGAIN 1
  FEEDBACK 0
  PANLAW 1
  PROJOFFS 0 0 0
  MAXPROJLEN 0 600
  GRID 3199 8 1 8 1 0 0 0
  TIMEMODE 1 5 -1 30 0 0 -1
  VIDEO_CONFIG 0 0 256
  PANMODE 3
  CURSOR 0
  ZOOM 100 0 0
  VZOOMEX 6 0
  USE_REC_CFG 0
  RECMODE 1
  SMPTESYNC 0 30 100 40 1000 300 0 0 1 0 0
  LOOP 0
  LOOPGRAN 0 4
  RECORD_PATH \"\" \"\"
  <RECORD_CFG
  >
  <APPLYFX_CFG
  >
  RENDER_FILE \"\"
  RENDER_PATTERN \"\"
  RENDER_FMT 0 2 0
  RENDER_1X 0
  RENDER_RANGE 1 0 0 18 1000
  RENDER_RESAMPLE 3 0 1
  RENDER_ADDTOPROJ 0
  RENDER_STEMS 0
  RENDER_DITHER 0
  TIMELOCKMODE 1
  TEMPOENVLOCKMODE 1
  ITEMMIX 1
  DEFPITCHMODE 589824 0
  TAESSION 1
  TAESSION2 0 \"\"
  POOLEDENVLANE 0
  ENVPOOLLANE 0
  MARKERSEDITMODE 0
";

const MIDDLE: &str = "  <RENDER_CFG
  >
  LOCK 0
  <METRONOME 6 2
    VOL 0.25 0.125
    FREQ 800 1600 1
    BEATLEN 4
    SAMPLES \"\" \"\"
    PATTERN 2863311530 2863311529
    MULT 1
  >
  GLOBAL_AUTO -1
  TEMPO 120 4 4
  PLAYRATE 1 0 0.25 4
  SELECTION 0 0
  SELECTION2 0 0
  MASTERAUTOMODE 0
  MASTERTRACKHEIGHT 0 0
  MASTERPEAKCOL 16576
  MASTERMUTESOLO 0
  MASTERTRACKVIEW 0 0.6667 0.5 0.5 0 0 0 0 0 0 0 0 0
  MASTERHWOUT 0 0 1 0 0 0 0 -1
  MASTER_NCH 2 2
  MASTER_VOLUME 1 0 -1 -1 1
  MASTER_PANMODE 3
  MASTER_FX 1
  MASTER_SEL 0
";
