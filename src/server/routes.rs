use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use togglboard_core::{DeviceAdapter, TrackerAdapter};

use super::AppState;

const TOGGL_FAILED: &str = "Connection to Toggl API failed!";
const PARTICLE_FAILED: &str = "Connection to Particle API failed!";

#[derive(Debug, Serialize)]
struct ApiResponse {
    message: String,
    data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn ok(message: &str, data: impl Serialize) -> Response {
    let data = serde_json::to_value(data).unwrap_or(Value::Null);
    Json(ApiResponse {
        message: message.to_string(),
        data,
        error: None,
    })
    .into_response()
}

fn failed(message: &str, error: impl ToString) -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(ApiResponse {
            message: message.to_string(),
            data: json!({}),
            error: Some(error.to_string()),
        }),
    )
        .into_response()
}

pub async fn ping() -> Response {
    ok("pong", json!({}))
}

/// Runs a cycle now, queueing behind one already in flight.
pub async fn sync_now(State(state): State<AppState>) -> Response {
    match state.driver.run_cycle().await {
        Ok(observed) => ok("OK", observed),
        Err(e) => failed("Sync failed!", e),
    }
}

pub async fn status(State(state): State<AppState>) -> Response {
    ok("OK", state.driver.status())
}

pub async fn toggl_test(State(state): State<AppState>) -> Response {
    match state.toggl.test().await {
        Ok(_) => ok("Successfully connected to Toggl API", json!({})),
        Err(e) => failed(TOGGL_FAILED, e),
    }
}

pub async fn toggl_current(State(state): State<AppState>) -> Response {
    match state.toggl.get_current_state().await {
        Ok(current) => ok("OK", current),
        Err(e) => failed(TOGGL_FAILED, e),
    }
}

pub async fn particle_test(State(state): State<AppState>) -> Response {
    match state.particle.test().await {
        Ok(true) => ok("Successfully connected to Particle API", json!({})),
        Ok(false) => failed(PARTICLE_FAILED, "Particle device is offline"),
        Err(e) => failed(PARTICLE_FAILED, e),
    }
}

pub async fn particle_current(State(state): State<AppState>) -> Response {
    match state.particle.get_current_state().await {
        Ok(current) => ok("OK", current),
        Err(e) => failed(PARTICLE_FAILED, e),
    }
}
