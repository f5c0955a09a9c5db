mod action;
mod position_table;
mod state;

pub use action::Action;
pub use position_table::{PositionTable, ProjectId, DEFAULT_SLOT_COUNT};
pub use state::{DeviceState, ObservedState, TrackerState};
