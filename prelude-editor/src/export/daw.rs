//! DAW track setup sheets (CSV and plain text)
//!
//! One DAW track per input-list entry, numbered by position.

use prelude_common::model::{InputListItem, Project, TrackFormat};

const CSV_HEADERS: [&str; 7] = [
    "Track #",
    "Track Name",
    "Format",
    "Color",
    "Microphone",
    "Preamp",
    "Notes",
];

/// Display name of the input at zero-based `index`
pub fn track_name(item: &InputListItem, index: usize) -> String {
    if item.source.is_empty() {
        format!("Track {}", index + 1)
    } else {
        item.source.clone()
    }
}

/// Quote a field containing a comma, quote or newline
fn escape_csv(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

pub fn csv(project: &Project) -> String {
    let mut lines = vec![CSV_HEADERS.join(",")];

    for (index, item) in project.input_list.iter().enumerate() {
        let fields = [
            (index + 1).to_string(),
            track_name(item, index),
            item.track_format.label().to_string(),
            item.track_color.as_str().to_string(),
            item.microphone.clone(),
            item.preamp.clone(),
            item.notes.clone(),
        ];
        lines.push(
            fields
                .iter()
                .map(|f| escape_csv(f))
                .collect::<Vec<_>>()
                .join(","),
        );
    }

    lines.join("\n")
}

pub fn text_sheet(project: &Project) -> String {
    let rule = "=".repeat(60);
    let divider = "-".repeat(60);
    let mut lines = vec![
        rule.clone(),
        "DAW TRACK SETUP SHEET".to_string(),
        format!("Project: {}", project.overview.name),
        rule,
        String::new(),
        "Use this reference when creating tracks in your DAW.".to_string(),
        String::new(),
        divider.clone(),
    ];

    for (index, item) in project.input_list.iter().enumerate() {
        lines.push(String::new());
        lines.push(format!("Track {}: {}", index + 1, track_name(item, index)));
        lines.push(format!("  Format: {}", item.track_format.label()));
        if item.track_color.is_set() {
            lines.push(format!("  Color: {}", item.track_color.as_str()));
        }
        let optional = [
            ("Input Channel", &item.channel),
            ("Microphone", &item.microphone),
            ("Preamp", &item.preamp),
            ("Notes", &item.notes),
        ];
        for (label, value) in optional {
            if !value.is_empty() {
                lines.push(format!("  {}: {}", label, value));
            }
        }
    }

    let stereo = project
        .input_list
        .iter()
        .filter(|i| i.track_format == TrackFormat::Stereo)
        .count();

    lines.push(String::new());
    lines.push(divider);
    lines.push(format!("Total Tracks: {}", project.input_list.len()));
    lines.push(format!("Mono Tracks: {}", project.input_list.len() - stereo));
    lines.push(format!("Stereo Tracks: {}", stereo));
    lines.push(String::new());

    lines.join("\n")
}
