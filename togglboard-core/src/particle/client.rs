//! HTTP client for the Particle cloud API.

use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use futures::{StreamExt, TryStreamExt};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use super::events::{SseEvent, SseParser};
use super::types::{is_timeout, FunctionRequest, FunctionResponse, PingResponse, VariableResponse};
use crate::models::DeviceState;
use crate::sync::{AdapterError, DeviceAdapter};

pub const DEFAULT_PARTICLE_URL: &str = "https://api.particle.io/v1";

const CONNECTION_FAILED: &str = "Connection to Particle API failed!";
const UNEXPECTED_RESPONSE: &str = "Unexpected Particle response!";
const DEVICE_TIMED_OUT: &str = "Particle device timed out!";

const ACTUAL_POSITION: &str = "actualPosIdx";
const SENSOR_VALUE: &str = "actualPosSen";
const TARGET_POSITION: &str = "targetPosIdx";
const SET_TARGET_POSITION: &str = "setTargetPos";

/// Stream of events published by the device.
pub type EventStream = BoxStream<'static, Result<SseEvent, AdapterError>>;

/// Particle cloud client bound to a single device.
#[derive(Debug, Clone)]
pub struct ParticleClient {
    http: reqwest::Client,
    base_url: String,
    api_token: String,
    device_name: String,
}

impl ParticleClient {
    pub fn new(api_token: impl Into<String>, device_name: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_PARTICLE_URL.to_string(),
            api_token: api_token.into(),
            device_name: device_name.into(),
        }
    }

    /// Points the client at a different API root (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    fn device_url(&self, path: &str) -> String {
        format!("{}/devices/{}/{}", self.base_url, self.device_name, path)
    }

    /// URL of the device's server-sent event stream.
    pub fn events_url(&self) -> String {
        self.device_url("events")
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.device_url(path))
            .bearer_auth(&self.api_token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
    }

    async fn send(&self, request: RequestBuilder) -> Result<(StatusCode, Vec<u8>), AdapterError> {
        let response = request.send().await.map_err(|e| {
            tracing::debug!("Particle request failed: {}", e);
            AdapterError::Unreachable(CONNECTION_FAILED.to_string())
        })?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|_| AdapterError::Unreachable(CONNECTION_FAILED.to_string()))?;
        Ok((status, body.to_vec()))
    }

    /// Sends a request and decodes a successful JSON body.
    ///
    /// The cloud answers with an `error` field when the device is offline
    /// or slow; that is reported as [`AdapterError::TimedOut`] whatever the
    /// status code.
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, AdapterError> {
        let (status, body) = self.send(request).await?;

        if let Ok(value) = serde_json::from_slice::<serde_json::Value>(&body) {
            if is_timeout(value.get("error").and_then(|e| e.as_str())) {
                return Err(AdapterError::TimedOut(DEVICE_TIMED_OUT.to_string()));
            }
        }
        if !status.is_success() {
            tracing::debug!("Particle returned status {}", status);
            return Err(AdapterError::Unreachable(CONNECTION_FAILED.to_string()));
        }

        serde_json::from_slice(&body).map_err(|e| {
            tracing::debug!("Failed to decode Particle response: {}", e);
            AdapterError::UnexpectedResponse(UNEXPECTED_RESPONSE.to_string())
        })
    }

    /// Pings the device through the cloud; returns whether it is online.
    pub async fn test(&self) -> Result<bool, AdapterError> {
        let ping: PingResponse = self.send_json(self.request(Method::PUT, "ping")).await?;
        Ok(ping.online)
    }

    async fn read_variable(&self, name: &str) -> Result<i32, AdapterError> {
        let response: VariableResponse = self.send_json(self.request(Method::GET, name)).await?;
        if response.name.as_deref() != Some(name) {
            return Err(AdapterError::UnexpectedResponse(UNEXPECTED_RESPONSE.to_string()));
        }
        response
            .result
            .as_ref()
            .and_then(|v| v.as_i64())
            .and_then(|v| i32::try_from(v).ok())
            .ok_or_else(|| AdapterError::UnexpectedResponse(UNEXPECTED_RESPONSE.to_string()))
    }

    /// Opens the device's event stream.
    ///
    /// The stream ends when the cloud closes the connection; callers are
    /// expected to reconnect.
    pub async fn subscribe(&self) -> Result<EventStream, AdapterError> {
        let response = self
            .http
            .get(self.events_url())
            .query(&[("access_token", self.api_token.as_str())])
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|_| AdapterError::Unreachable(CONNECTION_FAILED.to_string()))?;

        if !response.status().is_success() {
            tracing::debug!("Particle event stream returned status {}", response.status());
            return Err(AdapterError::Unreachable(CONNECTION_FAILED.to_string()));
        }

        let mut parser = SseParser::new();
        let events = response
            .bytes_stream()
            .map(move |chunk| match chunk {
                Ok(bytes) => Ok(parser.push(&bytes)),
                Err(e) => {
                    tracing::debug!("Particle event stream failed: {}", e);
                    Err(AdapterError::Unreachable(CONNECTION_FAILED.to_string()))
                }
            })
            .map_ok(|events| stream::iter(events.into_iter().map(Ok::<SseEvent, AdapterError>)))
            .try_flatten();

        Ok(events.boxed())
    }
}

#[async_trait]
impl DeviceAdapter for ParticleClient {
    async fn get_current_state(&self) -> Result<DeviceState, AdapterError> {
        let actual_position = self.read_variable(ACTUAL_POSITION).await?;
        let sensor_value = self.read_variable(SENSOR_VALUE).await?;
        let target_position = self.read_variable(TARGET_POSITION).await?;
        Ok(DeviceState {
            actual_position: Some(actual_position),
            target_position: Some(target_position),
            sensor_value: Some(sensor_value),
        })
    }

    async fn set_current_state(&self, position: usize) -> Result<DeviceState, AdapterError> {
        let body = FunctionRequest {
            arg: position.to_string(),
        };
        let response: FunctionResponse = self
            .send_json(self.request(Method::POST, SET_TARGET_POSITION).json(&body))
            .await?;

        // A refused move fails the cycle; the next one bootstraps from
        // Toggl and asks for the same position again.
        match response.return_value {
            Some(0) => {}
            Some(code) => return Err(AdapterError::Rejected(code)),
            None => {
                return Err(AdapterError::UnexpectedResponse(
                    UNEXPECTED_RESPONSE.to_string(),
                ))
            }
        }
        tracing::debug!(position, "set Particle target position");

        // The move was accepted, so a failed re-read only loses the report.
        match self.get_current_state().await {
            Ok(state) => Ok(state),
            Err(e) => {
                tracing::warn!("Could not re-read Particle state after move: {}", e);
                Ok(DeviceState {
                    target_position: i32::try_from(position).ok(),
                    ..DeviceState::default()
                })
            }
        }
    }
}
