//! Verbs shared by every ordered sub-collection

use prelude_common::model::Entity;
use prelude_common::uuid_utils;
use serde::{Deserialize, Serialize};

use super::patch::Patch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// What applying a mutation did to the project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MutationOutcome {
    /// The project changed and `updatedAt` was refreshed
    Applied,
    /// The operation was valid but left the project as it was (boundary reorder)
    Unchanged,
    /// A referenced entity, parent or optional section does not exist
    NotFound,
}

impl MutationOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, MutationOutcome::Applied)
    }
}

/// Operation on one list of entities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verb", rename_all = "camelCase")]
pub enum ListOp<T, P> {
    /// Append; any id carried by the item is replaced with a fresh one
    Add(T),
    Update { id: String, patch: P },
    Delete { id: String },
    Reorder { id: String, direction: Direction },
}

impl<T, P> ListOp<T, P> {
    pub fn verb(&self) -> &'static str {
        match self {
            ListOp::Add(_) => "add",
            ListOp::Update { .. } => "update",
            ListOp::Delete { .. } => "delete",
            ListOp::Reorder { .. } => "reorder",
        }
    }
}

/// Apply `op` to `items` in place
pub fn apply_list<T, P>(items: &mut Vec<T>, op: ListOp<T, P>) -> MutationOutcome
where
    T: Entity,
    P: Patch<T>,
{
    match op {
        ListOp::Add(item) => {
            add(items, item);
            MutationOutcome::Applied
        }
        ListOp::Update { id, patch } => update(items, &id, patch),
        ListOp::Delete { id } => delete(items, &id),
        ListOp::Reorder { id, direction } => reorder(items, &id, direction),
    }
}

/// Append `item` under a freshly generated id and return that id
///
/// Nested entities carried by the item are re-identified as well.
pub fn add<T: Entity>(items: &mut Vec<T>, mut item: T) -> String {
    let id = uuid_utils::new_id();
    item.set_id(id.clone());
    item.regenerate_child_ids();
    items.push(item);
    id
}

pub fn update<T: Entity, P: Patch<T>>(items: &mut [T], id: &str, patch: P) -> MutationOutcome {
    match items.iter_mut().find(|item| item.id() == id) {
        Some(item) => {
            patch.apply_to(item);
            MutationOutcome::Applied
        }
        None => MutationOutcome::NotFound,
    }
}

pub fn delete<T: Entity>(items: &mut Vec<T>, id: &str) -> MutationOutcome {
    let before = items.len();
    items.retain(|item| item.id() != id);
    if items.len() == before {
        MutationOutcome::NotFound
    } else {
        MutationOutcome::Applied
    }
}

/// Swap the entity with its neighbour; moving past either end is a no-op
pub fn reorder<T: Entity>(items: &mut [T], id: &str, direction: Direction) -> MutationOutcome {
    let Some(index) = items.iter().position(|item| item.id() == id) else {
        return MutationOutcome::NotFound;
    };

    let swap_with = match direction {
        Direction::Up if index == 0 => return MutationOutcome::Unchanged,
        Direction::Down if index + 1 == items.len() => return MutationOutcome::Unchanged,
        Direction::Up => index - 1,
        Direction::Down => index + 1,
    };

    items.swap(index, swap_with);
    MutationOutcome::Applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::patch::TimelinePatch;
    use prelude_common::model::{ScheduleBlock, Session, TimelinePhase};

    fn phases(ids: &[&str]) -> Vec<TimelinePhase> {
        ids.iter()
            .map(|id| TimelinePhase {
                id: id.to_string(),
                phase: id.to_uppercase(),
                ..Default::default()
            })
            .collect()
    }

    fn ids(items: &[TimelinePhase]) -> Vec<&str> {
        items.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_reorder_swaps_adjacent() {
        let mut items = phases(&["a", "b", "c"]);
        assert_eq!(reorder(&mut items, "b", Direction::Up), MutationOutcome::Applied);
        assert_eq!(ids(&items), vec!["b", "a", "c"]);
        assert_eq!(reorder(&mut items, "b", Direction::Down), MutationOutcome::Applied);
        assert_eq!(ids(&items), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_reorder_boundaries_are_noops() {
        let mut items = phases(&["a", "b", "c"]);
        let before = items.clone();
        assert_eq!(reorder(&mut items, "a", Direction::Up), MutationOutcome::Unchanged);
        assert_eq!(reorder(&mut items, "c", Direction::Down), MutationOutcome::Unchanged);
        assert_eq!(items, before);
    }

    #[test]
    fn test_single_element_reorder_is_noop() {
        let mut items = phases(&["only"]);
        assert_eq!(reorder(&mut items, "only", Direction::Up), MutationOutcome::Unchanged);
        assert_eq!(reorder(&mut items, "only", Direction::Down), MutationOutcome::Unchanged);
    }

    #[test]
    fn test_stale_ids_report_not_found() {
        let mut items = phases(&["a"]);
        assert_eq!(reorder(&mut items, "zz", Direction::Up), MutationOutcome::NotFound);
        assert_eq!(delete(&mut items, "zz"), MutationOutcome::NotFound);
        assert_eq!(
            update(&mut items, "zz", TimelinePatch::default()),
            MutationOutcome::NotFound
        );
        assert_eq!(items, phases(&["a"]));
    }

    #[test]
    fn test_add_replaces_caller_id() {
        let mut items = Vec::new();
        let id = add(
            &mut items,
            TimelinePhase {
                id: "caller-chosen".into(),
                ..Default::default()
            },
        );
        assert_ne!(id, "caller-chosen");
        assert_eq!(items[0].id, id);
    }

    #[test]
    fn test_add_session_reidentifies_schedule_blocks() {
        let mut sessions = Vec::new();
        let block = ScheduleBlock {
            id: "b".into(),
            activity: "Setup".into(),
            ..Default::default()
        };
        add(
            &mut sessions,
            Session {
                schedule: vec![block.clone(), block],
                ..Default::default()
            },
        );

        let block_ids: Vec<&str> = sessions[0].schedule.iter().map(|b| b.id.as_str()).collect();
        assert!(!block_ids.contains(&"b"));
        assert_ne!(block_ids[0], block_ids[1]);
        assert_eq!(sessions[0].schedule[1].activity, "Setup");
    }

    #[test]
    fn test_list_op_wire_format() {
        let op: ListOp<TimelinePhase, TimelinePatch> =
            serde_json::from_str(r#"{"verb":"reorder","id":"a","direction":"down"}"#).unwrap();
        assert_eq!(
            op,
            ListOp::Reorder {
                id: "a".into(),
                direction: Direction::Down
            }
        );
        assert_eq!(op.verb(), "reorder");
    }
}
