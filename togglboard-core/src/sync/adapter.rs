use async_trait::async_trait;

use super::error::AdapterError;
use crate::models::{DeviceState, ProjectId, TrackerState};

/// Read/write access to the time tracker's running project.
#[async_trait]
pub trait TrackerAdapter: Send + Sync {
    async fn get_current_state(&self) -> Result<TrackerState, AdapterError>;

    /// Starts tracking `project`, or stops the running entry on `None`.
    ///
    /// Returns the tracker state after the change.
    async fn set_current_state(
        &self,
        project: Option<ProjectId>,
    ) -> Result<TrackerState, AdapterError>;
}

/// Read/write access to the board's position.
#[async_trait]
pub trait DeviceAdapter: Send + Sync {
    async fn get_current_state(&self) -> Result<DeviceState, AdapterError>;

    /// Asks the board to move to `position` (0 = off).
    async fn set_current_state(&self, position: usize) -> Result<DeviceState, AdapterError>;
}
