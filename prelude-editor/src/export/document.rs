//! Content tree of the pre-production plan
//!
//! Built once from a project with every reference already resolved; the PDF
//! and DOCX renderers only lay it out.

use chrono::{DateTime, NaiveDate, Utc};
use prelude_common::model::Project;
use prelude_common::time;

use super::resolve::{
    equipment_groups, instrument_names, instrument_track_name, performer_display,
    personnel_names,
};
use super::rich_text::html_to_plain_text;

/// Take rows every take sheet has at least
pub const MIN_TAKE_ROWS: usize = 15;

/// Column headers of a take sheet grid
pub const TAKE_HEADERS: [&str; 4] = ["Take", "Timecode", "Circle", "Notes"];

/// Placeholder for empty labelled values
const EMPTY_VALUE: &str = "N/A";

#[derive(Debug, Clone, PartialEq)]
pub struct TakeSheet {
    /// `Track {n}: {title}`
    pub title: String,
    pub project_name: String,
    /// Labelled track metadata, only the non-empty ones
    pub fields: Vec<(String, String)>,
    pub min_rows: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Title(String),
    Subtitle(String),
    Heading(String),
    Subheading(String),
    Field { label: String, value: String },
    /// A label with its content in the following paragraph
    Label(String),
    Paragraph(String),
    Table { headers: Vec<String>, rows: Vec<Vec<String>> },
    Checklist { label: String, items: Vec<String> },
    TakeSheet(TakeSheet),
    PageBreak,
    Spacer,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExportDocument {
    pub blocks: Vec<Block>,
}

impl ExportDocument {
    fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    fn field(&mut self, label: &str, value: &str) {
        let value = if value.is_empty() { EMPTY_VALUE } else { value };
        self.push(Block::Field {
            label: label.to_string(),
            value: value.to_string(),
        });
    }

    fn heading(&mut self, text: &str) {
        self.push(Block::Heading(text.to_string()));
    }

    fn paragraph(&mut self, text: String) {
        if !text.is_empty() {
            self.push(Block::Paragraph(text));
        }
    }

    fn table<const N: usize>(&mut self, headers: [&str; N], rows: Vec<Vec<String>>) {
        self.push(Block::Table {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows,
        });
    }

    /// Every take sheet in the document
    pub fn take_sheets(&self) -> impl Iterator<Item = &TakeSheet> {
        self.blocks.iter().filter_map(|b| match b {
            Block::TakeSheet(sheet) => Some(sheet),
            _ => None,
        })
    }

    /// Text of every heading, in order
    pub fn headings(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                Block::Heading(h) => Some(h.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Session date in long form ("Tuesday, March 4, 2025"), or "Date TBD"
fn session_date(date: &str) -> String {
    if date.is_empty() {
        return "Date TBD".to_string();
    }
    match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(d) => d.format("%A, %B %-d, %Y").to_string(),
        Err(_) => date.to_string(),
    }
}

fn or_tbd(s: &str) -> &str {
    if s.is_empty() {
        "TBD"
    } else {
        s
    }
}

/// Build the full plan document
pub fn build_plan(project: &Project, generated_at: DateTime<Utc>) -> ExportDocument {
    let mut doc = ExportDocument::default();
    let overview = &project.overview;

    doc.push(Block::Title("PRE-PRODUCTION PLAN".into()));
    doc.push(Block::Subtitle(format!("Generated {}", time::long_date(generated_at))));
    doc.push(Block::Spacer);

    doc.heading("Project Overview");
    doc.field("Project Name", &overview.name);
    doc.field("Client", &overview.client);
    doc.field("Project Type", overview.project_type.label());
    if !overview.start_date.is_empty() || !overview.end_date.is_empty() {
        doc.field(
            "Dates",
            &format!("{} - {}", or_tbd(&overview.start_date), or_tbd(&overview.end_date)),
        );
    }
    doc.paragraph(html_to_plain_text(&overview.description));
    if !overview.notes.is_empty() {
        doc.push(Block::Label("Notes".into()));
        doc.paragraph(overview.notes.clone());
    }
    doc.push(Block::Spacer);

    if !project.personnel.is_empty() {
        doc.heading("Personnel");
        doc.table(
            ["Name", "Roles", "Instrument", "Contact", "Notes"],
            project
                .personnel
                .iter()
                .map(|p| {
                    vec![
                        p.name.clone(),
                        p.roles.join(", "),
                        p.instrument.clone(),
                        p.contact.clone(),
                        p.notes.clone(),
                    ]
                })
                .collect(),
        );
    }

    let venue = &project.venue;
    doc.heading("Venue");
    doc.field("Venue Name", &venue.name);
    doc.field("Address", &venue.address);
    if !venue.room_name.is_empty() {
        doc.field("Room", &venue.room_name);
    }
    if !venue.dimensions.is_empty() {
        doc.field("Dimensions", &venue.dimensions);
    }
    if !venue.contact_person.is_empty() {
        doc.field(
            "Contact",
            format!("{} {}", venue.contact_person, venue.contact_phone).trim(),
        );
    }
    let acoustic = html_to_plain_text(&venue.acoustic_notes);
    if !acoustic.is_empty() {
        doc.push(Block::Label("Acoustic Notes".into()));
        doc.paragraph(acoustic);
    }
    doc.push(Block::Spacer);

    if !project.instrumentation.is_empty() {
        doc.heading("Instrumentation");
        doc.table(
            ["Instrument", "Performer", "Track Name", "Notes"],
            project
                .instrumentation
                .iter()
                .map(|i| {
                    vec![
                        i.instrument.clone(),
                        performer_display(project, i),
                        instrument_track_name(project, i),
                        i.notes.clone(),
                    ]
                })
                .collect(),
        );
    }

    let tracks = project.tracks_sorted();
    if !tracks.is_empty() {
        doc.heading("Track List");
        doc.table(
            ["#", "Title", "Duration", "Personnel", "Instruments", "Notes"],
            tracks
                .iter()
                .map(|t| {
                    vec![
                        t.track_number.to_string(),
                        t.title.clone(),
                        t.duration.clone(),
                        personnel_names(project, &t.personnel),
                        instrument_names(project, &t.instruments),
                        t.notes.clone(),
                    ]
                })
                .collect(),
        );
    }

    if !project.microphone_plan.is_empty() {
        doc.heading("Microphone Plan");
        doc.table(
            ["Source", "Microphone", "Qty", "Position", "Notes"],
            project
                .microphone_plan
                .iter()
                .map(|m| {
                    vec![
                        m.source.clone(),
                        m.microphone.clone(),
                        m.quantity.max(1).to_string(),
                        m.position.clone(),
                        m.notes.clone(),
                    ]
                })
                .collect(),
        );
    }

    if !project.input_list.is_empty() {
        doc.heading("Input List");
        doc.table(
            ["Ch", "Source", "Microphone", "Preamp", "Notes"],
            project
                .input_list
                .iter()
                .map(|i| {
                    vec![
                        i.channel.clone(),
                        i.source.clone(),
                        i.microphone.clone(),
                        i.preamp.clone(),
                        i.notes.clone(),
                    ]
                })
                .collect(),
        );
    }

    let setup = html_to_plain_text(&project.setup_notes.description);
    if !setup.is_empty() {
        doc.heading("Setup Notes");
        doc.paragraph(setup);
        doc.push(Block::Spacer);
    }

    if let Some(atmos) = &project.atmos_config {
        doc.heading("Atmos Configuration");
        doc.field("Renderer", &atmos.renderer_type);
        doc.field("Bed Format", &atmos.bed_format);
        doc.field("Max Objects", &atmos.max_objects.to_string());
        doc.field("Deliverables", &atmos.deliverables);
        doc.paragraph(html_to_plain_text(&atmos.notes));
        if !atmos.tracks.is_empty() {
            doc.table(
                ["Track", "Type", "Bed Assignment", "Behavior", "Height", "Notes"],
                atmos
                    .tracks
                    .iter()
                    .map(|t| {
                        vec![
                            t.name.clone(),
                            t.track_type.as_str().to_string(),
                            t.bed_assignment.clone(),
                            t.object_behavior.clone(),
                            t.height_layer.map(|h| h.as_str().to_string()).unwrap_or_default(),
                            t.notes.clone(),
                        ]
                    })
                    .collect(),
            );
        }
    }

    if !project.timeline.is_empty() {
        doc.heading("Timeline");
        doc.table(
            ["Phase", "Description", "Start", "End"],
            project
                .timeline
                .iter()
                .map(|t| {
                    vec![
                        t.phase.clone(),
                        t.description.clone(),
                        t.start_date.clone(),
                        t.end_date.clone(),
                    ]
                })
                .collect(),
        );
    }

    if !project.sessions.is_empty() {
        doc.heading("Session Schedule");
        for session in &project.sessions {
            doc.push(Block::Subheading(format!(
                "{} - {}",
                session_date(&session.date),
                session.session_type.label()
            )));
            doc.field("Time", &format!("{} - {}", session.start_time, session.end_time));
            if !session.venue.is_empty() {
                doc.field("Venue", &session.venue);
            }
            if !session.schedule.is_empty() {
                doc.table(
                    ["Start", "End", "Activity", "Notes"],
                    session
                        .schedule
                        .iter()
                        .map(|s| {
                            vec![
                                s.start_hour.clone(),
                                s.end_hour.clone(),
                                s.activity.clone(),
                                s.notes.clone(),
                            ]
                        })
                        .collect(),
                );
            }
        }
    }

    let groups = equipment_groups(project);
    if !groups.is_empty() {
        doc.push(Block::PageBreak);
        doc.push(Block::Title("EQUIPMENT CHECKLIST".into()));
        doc.push(Block::Subtitle(format!(
            "{} - Use this page to verify all equipment is packed/present",
            overview.name
        )));
        doc.push(Block::Spacer);
        for group in groups {
            doc.push(Block::Checklist {
                label: group.label,
                items: group.items,
            });
        }
    }

    for track in &tracks {
        let mut fields = Vec::new();
        if !track.duration.is_empty() {
            fields.push(("Duration".to_string(), track.duration.clone()));
        }
        let people = personnel_names(project, &track.personnel);
        if !people.is_empty() {
            fields.push(("Personnel".to_string(), people));
        }
        let instruments = instrument_names(project, &track.instruments);
        if !instruments.is_empty() {
            fields.push(("Instruments".to_string(), instruments));
        }
        if !track.notes.is_empty() {
            fields.push(("Notes".to_string(), track.notes.clone()));
        }

        let title = if track.title.is_empty() { "Untitled" } else { track.title.as_str() };
        doc.push(Block::PageBreak);
        doc.push(Block::TakeSheet(TakeSheet {
            title: format!("Track {}: {}", track.track_number, title),
            project_name: overview.name.clone(),
            fields,
            min_rows: MIN_TAKE_ROWS,
        }));
    }

    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use prelude_common::model::{
        create_empty_project, EquipmentItem, ProjectType, Session, SessionType, Track,
    };

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 4, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_empty_project_has_fixed_sections() {
        let project = create_empty_project("Empty", ProjectType::Other);
        let doc = build_plan(&project, at());

        assert_eq!(doc.blocks[0], Block::Title("PRE-PRODUCTION PLAN".into()));
        assert_eq!(doc.blocks[1], Block::Subtitle("Generated March 4, 2025".into()));
        assert_eq!(doc.headings(), vec!["Project Overview", "Venue"]);
        assert!(doc.blocks.contains(&Block::Field {
            label: "Client".into(),
            value: "N/A".into()
        }));
        assert_eq!(doc.take_sheets().count(), 0);
    }

    #[test]
    fn test_atmos_section_follows_config_presence() {
        let project = create_empty_project("Immersive", ProjectType::Atmos);
        let doc = build_plan(&project, at());
        assert!(doc.headings().contains(&"Atmos Configuration"));
        assert!(doc.blocks.contains(&Block::Field {
            label: "Bed Format".into(),
            value: "7.1.4".into()
        }));
    }

    #[test]
    fn test_take_sheets_sorted_by_track_number() {
        let mut project = create_empty_project("Album", ProjectType::Band);
        for (n, title) in [(2, "Second"), (1, "")] {
            project.track_list.push(Track {
                id: format!("t{}", n),
                track_number: n,
                title: title.into(),
                duration: "3:30".into(),
                ..Default::default()
            });
        }

        let doc = build_plan(&project, at());
        let sheets: Vec<&TakeSheet> = doc.take_sheets().collect();
        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[0].title, "Track 1: Untitled");
        assert_eq!(sheets[1].title, "Track 2: Second");
        assert_eq!(sheets[0].fields, vec![("Duration".to_string(), "3:30".to_string())]);
        assert!(sheets.iter().all(|s| s.min_rows >= 15));
    }

    #[test]
    fn test_equipment_checklist_on_new_page() {
        let mut project = create_empty_project("Album", ProjectType::Band);
        project.equipment.push(EquipmentItem {
            category: "cable".into(),
            item: "XLR 10m".into(),
            quantity: 12,
            ..Default::default()
        });

        let doc = build_plan(&project, at());
        let pos = doc
            .blocks
            .iter()
            .position(|b| *b == Block::Title("EQUIPMENT CHECKLIST".into()))
            .unwrap();
        assert_eq!(doc.blocks[pos - 1], Block::PageBreak);
        assert!(doc.blocks.contains(&Block::Checklist {
            label: "Cable".into(),
            items: vec!["XLR 10m (x12)".into()]
        }));
    }

    #[test]
    fn test_session_subheading() {
        let mut project = create_empty_project("Album", ProjectType::Band);
        project.sessions.push(Session {
            id: "s1".into(),
            date: "2025-03-04".into(),
            session_type: SessionType::Mixing,
            start_time: "10:00".into(),
            end_time: "18:00".into(),
            ..Default::default()
        });
        project.sessions.push(Session::default());

        let doc = build_plan(&project, at());
        assert!(doc
            .blocks
            .contains(&Block::Subheading("Tuesday, March 4, 2025 - Mixing".into())));
        assert!(doc.blocks.contains(&Block::Subheading("Date TBD - Recording".into())));
    }
}
