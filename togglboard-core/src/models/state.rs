use serde::{Deserialize, Serialize};

use super::ProjectId;

/// Snapshot of the Toggl timer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerState {
    /// Project of the running time entry, if any
    pub project_id: Option<ProjectId>,
    /// Display name of that project
    pub project_name: Option<String>,
    /// Description of the running time entry
    pub entry: Option<String>,
    pub entry_id: Option<u64>,
}

impl TrackerState {
    /// No time entry is running.
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn with_project(project_id: ProjectId) -> Self {
        Self {
            project_id: Some(project_id),
            ..Self::default()
        }
    }
}

/// Snapshot of the Particle board.
///
/// Values are read from separate cloud variables, so any of them may be
/// missing. Only `actual_position` takes part in reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceState {
    /// Slot the board is physically showing (0 = off)
    pub actual_position: Option<i32>,
    /// Slot the board is moving towards
    pub target_position: Option<i32>,
    /// Raw position sensor reading
    pub sensor_value: Option<i32>,
}

impl DeviceState {
    pub fn at(position: i32) -> Self {
        Self {
            actual_position: Some(position),
            ..Self::default()
        }
    }
}

/// Both sides as observed during one reconciliation cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedState {
    pub tracker: TrackerState,
    pub device: DeviceState,
}

impl ObservedState {
    pub fn new(tracker: TrackerState, device: DeviceState) -> Self {
        Self { tracker, device }
    }
}
