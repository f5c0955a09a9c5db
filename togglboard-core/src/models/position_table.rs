use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Number of project slots on the physical board (position 0 is "off").
pub const DEFAULT_SLOT_COUNT: usize = 7;

/// A Toggl project identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub u64);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ProjectId {
    fn from(id: u64) -> Self {
        ProjectId(id)
    }
}

/// Maps board slots to Toggl projects.
///
/// Entry `i` is shown at device position `i + 1`; device position 0 is
/// reserved for "no project". The table only describes the board when it
/// has exactly `slots` entries; see [`PositionTable::is_complete`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionTable {
    projects: Vec<ProjectId>,
    slots: usize,
}

impl PositionTable {
    /// Creates a table for the standard seven-slot board.
    pub fn new(projects: Vec<ProjectId>) -> Self {
        Self::with_slots(projects, DEFAULT_SLOT_COUNT)
    }

    pub fn with_slots(projects: Vec<ProjectId>, slots: usize) -> Self {
        Self { projects, slots }
    }

    /// Number of configured projects.
    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Number of slots on the board (N).
    pub fn slots(&self) -> usize {
        self.slots
    }

    /// True when every slot has exactly one project.
    pub fn is_complete(&self) -> bool {
        self.projects.len() == self.slots
    }

    /// First project that appears on more than one slot.
    ///
    /// Lookups return the first matching slot, so a repeated project makes
    /// its later slots unreachable from the tracker side.
    pub fn duplicate(&self) -> Option<ProjectId> {
        let mut seen = HashSet::new();
        self.projects.iter().copied().find(|id| !seen.insert(*id))
    }

    pub fn get(&self, index: usize) -> Option<ProjectId> {
        self.projects.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = ProjectId> + '_ {
        self.projects.iter().copied()
    }
}

impl<T: Into<ProjectId>> FromIterator<T> for PositionTable {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}
