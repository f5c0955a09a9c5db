//! Sync error types.

use thiserror::Error;

/// Errors raised by a tracker or device adapter.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Transport failure or non-success HTTP status
    #[error("{0}")]
    Unreachable(String),
    /// The device did not answer the cloud in time
    #[error("{0}")]
    TimedOut(String),
    /// The response did not have the expected shape
    #[error("{0}")]
    UnexpectedResponse(String),
    /// The device function returned an error code
    #[error("device rejected the request (return value {0})")]
    Rejected(i64),
}

/// Errors from a reconciliation cycle, tagged with the side that failed.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("tracker: {0}")]
    Tracker(#[source] AdapterError),
    #[error("device: {0}")]
    Device(#[source] AdapterError),
}
