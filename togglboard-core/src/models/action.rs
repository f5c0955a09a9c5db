use serde::Serialize;
use std::fmt;

use super::ProjectId;

/// The single corrective write chosen for a reconciliation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Action {
    /// Move the board to the given slot (0 = off).
    SetDevicePosition(usize),
    /// Start a time entry on the given project, or stop the timer on `None`.
    SetTrackerProject(Option<ProjectId>),
    NoAction,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::SetDevicePosition(position) => write!(f, "set device position to {}", position),
            Action::SetTrackerProject(Some(project)) => {
                write!(f, "set tracker project to {}", project)
            }
            Action::SetTrackerProject(None) => write!(f, "stop tracker"),
            Action::NoAction => write!(f, "no action"),
        }
    }
}
