//! HTTP front-end for the sync service.
//!
//! # Endpoints
//!
//! - `GET /ping`: Liveness check
//! - `PUT /sync`: Run a reconciliation cycle now and return what it observed
//! - `GET /status`: Outcome of recent cycles
//! - `GET /toggl/test`, `GET /toggl/current`: Toggl diagnostics
//! - `GET /particle/test`, `GET /particle/current`: Particle diagnostics
//!
//! Every response has the shape `{ "message", "data", "error"? }`.

mod routes;

use axum::routing::{get, put};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use togglboard_core::{ParticleClient, TogglClient};

use crate::driver::Driver;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub driver: Arc<Driver>,
    pub toggl: TogglClient,
    pub particle: ParticleClient,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(routes::ping))
        .route("/sync", put(routes::sync_now))
        .route("/status", get(routes::status))
        .route("/toggl/test", get(routes::toggl_test))
        .route("/toggl/current", get(routes::toggl_current))
        .route("/particle/test", get(routes::particle_test))
        .route("/particle/current", get(routes::particle_current))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
