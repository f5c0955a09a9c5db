//! TogglBoard Core Library
//!
//! Keeps a Toggl timer and a Particle position board pointing at the same
//! project. The decision logic lives in [`reconcile`]; [`sync`] runs one
//! reconciliation cycle against any pair of adapters.

pub mod models;
pub mod particle;
pub mod reconcile;
pub mod sync;
pub mod toggl;

#[cfg(test)]
mod mock_server;

pub use models::{
    Action, DeviceState, ObservedState, PositionTable, ProjectId, TrackerState,
    DEFAULT_SLOT_COUNT,
};
pub use particle::{ParticleClient, SseEvent, SseParser, TRIGGER_EVENTS};
pub use reconcile::{calculate_action, lookup_project_index, validate_state};
pub use sync::{sync, AdapterError, DeviceAdapter, SyncError, TrackerAdapter};
pub use toggl::TogglClient;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
