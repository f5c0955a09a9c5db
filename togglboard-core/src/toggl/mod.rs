//! Toggl API v8 tracker adapter.

mod client;
mod types;

pub use client::{TogglClient, DEFAULT_TOGGL_URL};
