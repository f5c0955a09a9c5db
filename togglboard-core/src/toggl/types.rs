//! Toggl wire types.

use serde::{Deserialize, Serialize};

use crate::models::{ProjectId, TrackerState};

/// Response from `GET /me?with_related_data=true`.
#[derive(Debug, Deserialize)]
pub(crate) struct MeResponse {
    pub data: MeData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MeData {
    pub projects: Vec<Project>,
    pub time_entries: Vec<TimeEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Project {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TimeEntry {
    pub id: u64,
    pub pid: Option<u64>,
    /// Negative while the entry is running
    pub duration: i64,
    pub description: Option<String>,
}

/// Response from the time entry start/stop endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct TimeEntryResponse {
    pub data: TimeEntry,
}

#[derive(Debug, Serialize)]
pub(crate) struct StartRequest {
    pub time_entry: NewTimeEntry,
}

#[derive(Debug, Serialize)]
pub(crate) struct NewTimeEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u64>,
    pub created_with: &'static str,
}

impl MeData {
    /// The running time entry, if any.
    pub fn running_entry(&self) -> Option<&TimeEntry> {
        self.time_entries.iter().find(|entry| entry.duration < 0)
    }

    pub fn current_state(&self) -> TrackerState {
        match self.running_entry() {
            Some(entry) => self.state_for(entry),
            None => TrackerState::idle(),
        }
    }

    /// Joins `entry` against the project list.
    pub fn state_for(&self, entry: &TimeEntry) -> TrackerState {
        let project_name = entry.pid.and_then(|pid| {
            self.projects
                .iter()
                .find(|project| project.id == pid)
                .map(|project| project.name.clone())
        });
        TrackerState {
            project_id: entry.pid.map(ProjectId),
            project_name,
            entry: entry.description.clone(),
            entry_id: Some(entry.id),
        }
    }
}
