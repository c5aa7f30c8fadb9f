//! Mutation engine
//!
//! [`apply`] is pure: it borrows the current project, never modifies it, and
//! returns the next project together with a [`MutationOutcome`]. Only an
//! `Applied` outcome refreshes `updatedAt`.

pub mod list;
pub mod patch;

use chrono::{DateTime, Utc};
use prelude_common::model::{
    AtmosTrack, EquipmentItem, InputListItem, Instrumentation, MicrophonePlanItem, Personnel,
    Preamp, Project, ScheduleBlock, Session, SetupDiagram, TimelinePhase, Track, VenueImage,
};
use prelude_common::time;
use serde::{Deserialize, Serialize};

pub use list::{apply_list, Direction, ListOp, MutationOutcome};
pub use patch::*;

/// One edit to a project, expressed as a value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "target", content = "args", rename_all = "camelCase")]
pub enum Mutation {
    UpdateOverview(OverviewPatch),
    UpdateVenue(VenuePatch),
    UpdateSetupNotes(SetupNotesPatch),
    /// `NotFound` when the project has no atmos configuration
    UpdateAtmosConfig(AtmosConfigPatch),

    Personnel(ListOp<Personnel, PersonnelPatch>),
    VenueImages(ListOp<VenueImage, VenueImagePatch>),
    Instrumentation(ListOp<Instrumentation, InstrumentationPatch>),
    Tracks(ListOp<Track, TrackPatch>),
    MicrophonePlan(ListOp<MicrophonePlanItem, MicrophonePlanPatch>),
    InputList(ListOp<InputListItem, InputListPatch>),
    Equipment(ListOp<EquipmentItem, EquipmentPatch>),
    Preamps(ListOp<Preamp, PreampPatch>),
    SetupDiagrams(ListOp<SetupDiagram, SetupDiagramPatch>),
    AtmosTracks(ListOp<AtmosTrack, AtmosTrackPatch>),
    Timeline(ListOp<TimelinePhase, TimelinePatch>),
    Sessions(ListOp<Session, SessionPatch>),
    ScheduleBlocks {
        #[serde(rename = "sessionId")]
        session_id: String,
        op: ListOp<ScheduleBlock, ScheduleBlockPatch>,
    },
}

impl Mutation {
    /// Short `collection.verb` label used in logs
    pub fn describe(&self) -> String {
        let (target, verb) = match self {
            Mutation::UpdateOverview(_) => ("overview", "update"),
            Mutation::UpdateVenue(_) => ("venue", "update"),
            Mutation::UpdateSetupNotes(_) => ("setupNotes", "update"),
            Mutation::UpdateAtmosConfig(_) => ("atmosConfig", "update"),
            Mutation::Personnel(op) => ("personnel", op.verb()),
            Mutation::VenueImages(op) => ("venue.images", op.verb()),
            Mutation::Instrumentation(op) => ("instrumentation", op.verb()),
            Mutation::Tracks(op) => ("trackList", op.verb()),
            Mutation::MicrophonePlan(op) => ("microphonePlan", op.verb()),
            Mutation::InputList(op) => ("inputList", op.verb()),
            Mutation::Equipment(op) => ("equipment", op.verb()),
            Mutation::Preamps(op) => ("preamps", op.verb()),
            Mutation::SetupDiagrams(op) => ("setupNotes.diagrams", op.verb()),
            Mutation::AtmosTracks(op) => ("atmosConfig.tracks", op.verb()),
            Mutation::Timeline(op) => ("timeline", op.verb()),
            Mutation::Sessions(op) => ("sessions", op.verb()),
            Mutation::ScheduleBlocks { op, .. } => ("sessions.schedule", op.verb()),
        };
        format!("{}.{}", target, verb)
    }
}

/// Apply a mutation, stamping `updatedAt` with the current time
pub fn apply(project: &Project, mutation: Mutation) -> (Project, MutationOutcome) {
    apply_at(project, mutation, time::now())
}

/// Apply a mutation, stamping `updatedAt` with `now` if anything changed
pub fn apply_at(
    project: &Project,
    mutation: Mutation,
    now: DateTime<Utc>,
) -> (Project, MutationOutcome) {
    let mut next = project.clone();
    let outcome = apply_in_place(&mut next, mutation);

    match outcome {
        MutationOutcome::Applied => {
            next.updated_at = now;
            (next, outcome)
        }
        MutationOutcome::Unchanged | MutationOutcome::NotFound => (project.clone(), outcome),
    }
}

fn apply_in_place(project: &mut Project, mutation: Mutation) -> MutationOutcome {
    match mutation {
        Mutation::UpdateOverview(p) => {
            p.apply_to(&mut project.overview);
            MutationOutcome::Applied
        }
        Mutation::UpdateVenue(p) => {
            p.apply_to(&mut project.venue);
            MutationOutcome::Applied
        }
        Mutation::UpdateSetupNotes(p) => {
            p.apply_to(&mut project.setup_notes);
            MutationOutcome::Applied
        }
        Mutation::UpdateAtmosConfig(p) => match project.atmos_config.as_mut() {
            Some(config) => {
                p.apply_to(config);
                MutationOutcome::Applied
            }
            None => MutationOutcome::NotFound,
        },

        Mutation::Personnel(op) => apply_list(&mut project.personnel, op),
        Mutation::VenueImages(op) => apply_list(&mut project.venue.images, op),
        Mutation::Instrumentation(op) => apply_list(&mut project.instrumentation, op),
        Mutation::Tracks(op) => apply_list(&mut project.track_list, op),
        Mutation::MicrophonePlan(op) => apply_list(&mut project.microphone_plan, op),
        Mutation::InputList(op) => apply_list(&mut project.input_list, op),
        Mutation::Equipment(op) => apply_list(&mut project.equipment, op),
        Mutation::Preamps(op) => apply_list(&mut project.preamps, op),
        Mutation::SetupDiagrams(op) => apply_list(&mut project.setup_notes.diagrams, op),
        Mutation::AtmosTracks(op) => match project.atmos_config.as_mut() {
            Some(config) => apply_list(&mut config.tracks, op),
            None => MutationOutcome::NotFound,
        },
        Mutation::Timeline(op) => apply_list(&mut project.timeline, op),
        Mutation::Sessions(op) => apply_list(&mut project.sessions, op),
        Mutation::ScheduleBlocks { session_id, op } => {
            match project.sessions.iter_mut().find(|s| s.id == session_id) {
                Some(session) => apply_list(&mut session.schedule, op),
                None => MutationOutcome::NotFound,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use prelude_common::model::{create_empty_project, HeightLayer, ProjectType, TrackFormat};

    fn stamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_input_is_left_untouched() {
        let original = create_empty_project("Demo", ProjectType::Band);
        let snapshot = original.clone();

        let (next, outcome) = apply_at(
            &original,
            Mutation::Personnel(ListOp::Add(Personnel {
                name: "Alice".into(),
                ..Default::default()
            })),
            stamp(),
        );

        assert_eq!(outcome, MutationOutcome::Applied);
        assert_eq!(original, snapshot);
        assert_eq!(next.personnel.len(), 1);
        assert_eq!(next.updated_at, stamp());
        assert_eq!(next.created_at, original.created_at);
    }

    #[test]
    fn test_not_found_does_not_touch_updated_at() {
        let project = create_empty_project("Demo", ProjectType::Band);
        let (next, outcome) = apply_at(
            &project,
            Mutation::Personnel(ListOp::Delete { id: "gone".into() }),
            stamp(),
        );
        assert_eq!(outcome, MutationOutcome::NotFound);
        assert_eq!(next, project);
    }

    #[test]
    fn test_atmos_ops_without_config_are_not_found() {
        let project = create_empty_project("Demo", ProjectType::Band);

        let (_, outcome) = apply(&project, Mutation::UpdateAtmosConfig(AtmosConfigPatch::default()));
        assert_eq!(outcome, MutationOutcome::NotFound);

        let (_, outcome) = apply(&project, Mutation::AtmosTracks(ListOp::Add(AtmosTrack::default())));
        assert_eq!(outcome, MutationOutcome::NotFound);
    }

    #[test]
    fn test_type_change_does_not_create_atmos_config() {
        let project = create_empty_project("Demo", ProjectType::Band);
        let (next, outcome) = apply(
            &project,
            Mutation::UpdateOverview(OverviewPatch {
                project_type: Some(ProjectType::Atmos),
                ..Default::default()
            }),
        );
        assert_eq!(outcome, MutationOutcome::Applied);
        assert_eq!(next.overview.project_type, ProjectType::Atmos);
        assert!(next.atmos_config.is_none());
    }

    #[test]
    fn test_schedule_blocks_scoped_to_session() {
        let project = create_empty_project("Demo", ProjectType::Band);
        let (project, _) = apply(&project, Mutation::Sessions(ListOp::Add(Session::default())));
        let session_id = project.sessions[0].id.clone();

        let (project, outcome) = apply(
            &project,
            Mutation::ScheduleBlocks {
                session_id: session_id.clone(),
                op: ListOp::Add(ScheduleBlock {
                    activity: "Drums".into(),
                    ..Default::default()
                }),
            },
        );
        assert_eq!(outcome, MutationOutcome::Applied);
        assert_eq!(project.sessions[0].schedule[0].activity, "Drums");

        let (_, outcome) = apply(
            &project,
            Mutation::ScheduleBlocks {
                session_id: "missing".into(),
                op: ListOp::Add(ScheduleBlock::default()),
            },
        );
        assert_eq!(outcome, MutationOutcome::NotFound);
    }

    #[test]
    fn test_boundary_reorder_is_unchanged() {
        let project = create_empty_project("Demo", ProjectType::Band);
        let (project, _) = apply(
            &project,
            Mutation::InputList(ListOp::Add(InputListItem {
                channel: "1".into(),
                track_format: TrackFormat::Mono,
                ..Default::default()
            })),
        );
        let id = project.input_list[0].id.clone();

        let (next, outcome) = apply_at(
            &project,
            Mutation::InputList(ListOp::Reorder {
                id,
                direction: Direction::Up,
            }),
            stamp(),
        );
        assert_eq!(outcome, MutationOutcome::Unchanged);
        assert_eq!(next, project);
    }

    #[test]
    fn test_mutation_wire_format() {
        let mutation: Mutation = serde_json::from_str(
            r#"{"target":"scheduleBlocks","args":{"sessionId":"s1","op":{"verb":"delete","id":"b1"}}}"#,
        )
        .unwrap();
        assert_eq!(mutation.describe(), "sessions.schedule.delete");

        let mutation: Mutation =
            serde_json::from_str(r#"{"target":"updateOverview","args":{"notes":"hi"}}"#).unwrap();
        assert_eq!(mutation.describe(), "overview.update");
    }

    #[test]
    fn test_venue_update_cannot_replace_images() {
        let project = create_empty_project("Demo", ProjectType::Band);
        let (project, _) = apply(&project, Mutation::VenueImages(ListOp::Add(VenueImage::default())));
        let (project, _) = apply(&project, Mutation::VenueImages(ListOp::Add(VenueImage::default())));

        let mutation: Mutation = serde_json::from_str(
            r#"{"target":"updateVenue","args":{"name":"Studio B","images":[{"id":"dup"},{"id":"dup"}]}}"#,
        )
        .unwrap();
        let (project, outcome) = apply(&project, mutation);
        assert_eq!(outcome, MutationOutcome::Applied);
        assert_eq!(project.venue.name, "Studio B");
        assert_eq!(project.venue.images.len(), 2);
        assert_ne!(project.venue.images[0].id, project.venue.images[1].id);

        let first = project.venue.images[0].id.clone();
        let (project, outcome) = apply(&project, Mutation::VenueImages(ListOp::Delete { id: first }));
        assert_eq!(outcome, MutationOutcome::Applied);
        assert_eq!(project.venue.images.len(), 1);
    }

    #[test]
    fn test_added_session_gets_fresh_block_ids() {
        let project = create_empty_project("Demo", ProjectType::Band);
        let block = ScheduleBlock {
            id: "b".into(),
            ..Default::default()
        };
        let (project, _) = apply(
            &project,
            Mutation::Sessions(ListOp::Add(Session {
                schedule: vec![block.clone(), block],
                ..Default::default()
            })),
        );
        let session_id = project.sessions[0].id.clone();
        let first = project.sessions[0].schedule[0].id.clone();
        assert_ne!(first, "b");

        let (project, outcome) = apply(
            &project,
            Mutation::ScheduleBlocks {
                session_id,
                op: ListOp::Delete { id: first },
            },
        );
        assert_eq!(outcome, MutationOutcome::Applied);
        assert_eq!(project.sessions[0].schedule.len(), 1);
    }

    #[test]
    fn test_null_height_layer_clears_it() {
        let project = create_empty_project("Demo", ProjectType::Atmos);
        let (project, _) = apply(
            &project,
            Mutation::AtmosTracks(ListOp::Add(AtmosTrack {
                name: "Choir".into(),
                height_layer: Some(HeightLayer::Overhead),
                ..Default::default()
            })),
        );
        let id = project.atmos_config.as_ref().unwrap().tracks[0].id.clone();

        let untouched: Mutation = serde_json::from_value(serde_json::json!({
            "target": "atmosTracks",
            "args": {"verb": "update", "id": id, "patch": {"notes": "wide"}}
        }))
        .unwrap();
        let (project, _) = apply(&project, untouched);
        let track = &project.atmos_config.as_ref().unwrap().tracks[0];
        assert_eq!(track.height_layer, Some(HeightLayer::Overhead));

        let clear: Mutation = serde_json::from_value(serde_json::json!({
            "target": "atmosTracks",
            "args": {"verb": "update", "id": id, "patch": {"heightLayer": null}}
        }))
        .unwrap();
        let (project, outcome) = apply(&project, clear);
        assert_eq!(outcome, MutationOutcome::Applied);
        let track = &project.atmos_config.as_ref().unwrap().tracks[0];
        assert_eq!(track.height_layer, None);
        assert_eq!(track.notes, "wide");
    }
}
