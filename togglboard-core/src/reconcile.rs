//! Decides which side of the Toggl/board pair to correct.
//!
//! Neither side publishes change events we can consume, so each cycle only
//! has two snapshots to compare: the one observed now and the one observed
//! on the previous cycle. From those the reconciler works out which side
//! moved and copies that side onto the other:
//!
//! - No previous snapshot (first cycle, or after an error): Toggl wins.
//! - Toggl changed, or nothing changed yet the sides disagree: Toggl wins.
//! - Only the board changed: the board wins.
//!
//! Everything here is pure; the caller owns the previous snapshot.

use crate::models::{Action, ObservedState, PositionTable, ProjectId};

/// Checks that a snapshot can be reconciled against `table`.
///
/// Fails when the board did not report its position, when that position
/// is outside `0..=N`, or when the table does not fill every slot.
pub fn validate_state(state: &ObservedState, table: &PositionTable) -> bool {
    if !table.is_complete() {
        return false;
    }
    match state.device.actual_position {
        Some(position) => position >= 0 && position as usize <= table.slots(),
        None => false,
    }
}

/// Returns the table index of `project_id`.
///
/// `None` covers both "no project" and "project not on the board".
pub fn lookup_project_index(project_id: Option<ProjectId>, table: &PositionTable) -> Option<usize> {
    let project_id = project_id?;
    table.iter().position(|id| id == project_id)
}

/// Board position that shows `project_id` (0 when it has no slot).
fn desired_position(project_id: Option<ProjectId>, table: &PositionTable) -> usize {
    match lookup_project_index(project_id, table) {
        Some(index) if index < table.slots() => index + 1,
        _ => 0,
    }
}

/// Picks the one corrective write for this cycle.
pub fn calculate_action(
    current: &ObservedState,
    previous: Option<&ObservedState>,
    table: &PositionTable,
) -> Action {
    if !validate_state(current, table) {
        return Action::NoAction;
    }
    let Some(actual) = current.device.actual_position.map(|p| p as usize) else {
        return Action::NoAction;
    };

    let project_id = current.tracker.project_id;
    let desired = desired_position(project_id, table);
    if desired == actual {
        return Action::NoAction;
    }

    let Some(previous) = previous else {
        return Action::SetDevicePosition(desired);
    };

    let tracker_changed = project_id != previous.tracker.project_id;
    let device_changed = current.device.actual_position != previous.device.actual_position;

    if tracker_changed || !device_changed {
        Action::SetDevicePosition(desired)
    } else if actual == 0 {
        Action::SetTrackerProject(None)
    } else {
        match table.get(actual - 1) {
            Some(project) => Action::SetTrackerProject(Some(project)),
            None => Action::NoAction,
        }
    }
}
