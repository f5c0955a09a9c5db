//! One reconciliation cycle: observe both sides, decide, apply.
//!
//! The adapters are traits so that the cycle can run against the real
//! Toggl/Particle clients or against in-memory fakes.

mod adapter;
mod cycle;
mod error;

pub use adapter::{DeviceAdapter, TrackerAdapter};
pub use cycle::sync;
pub use error::{AdapterError, SyncError};
