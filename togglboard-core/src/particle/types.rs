//! Particle cloud wire types.

use serde::{Deserialize, Serialize};

/// Response from reading a cloud variable.
#[derive(Debug, Deserialize)]
pub(crate) struct VariableResponse {
    pub name: Option<String>,
    pub result: Option<serde_json::Value>,
}

/// Response from calling a cloud function.
#[derive(Debug, Deserialize)]
pub(crate) struct FunctionResponse {
    pub return_value: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct FunctionRequest {
    pub arg: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PingResponse {
    #[serde(default)]
    pub online: bool,
}

/// True for the error the cloud reports when the device did not answer.
pub(crate) fn is_timeout(error: Option<&str>) -> bool {
    error
        .map(|e| e.to_lowercase().contains("timed out"))
        .unwrap_or(false)
}
