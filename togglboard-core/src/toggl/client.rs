//! HTTP client for the Toggl API.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;

use super::types::{MeResponse, NewTimeEntry, StartRequest, TimeEntryResponse};
use crate::models::{ProjectId, TrackerState};
use crate::sync::{AdapterError, TrackerAdapter};

pub const DEFAULT_TOGGL_URL: &str = "https://www.toggl.com/api/v8";

const CONNECTION_FAILED: &str = "Connection to Toggl API failed!";
const UNEXPECTED_RESPONSE: &str = "Unexpected Toggl response!";
const CREATED_WITH: &str = "TogglBoard";

/// Toggl API client.
///
/// Authenticates with the account's API token using HTTP basic auth.
#[derive(Debug, Clone)]
pub struct TogglClient {
    http: reqwest::Client,
    base_url: String,
    api_token: String,
}

impl TogglClient {
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_TOGGL_URL.to_string(),
            api_token: api_token.into(),
        }
    }

    /// Points the client at a different API root (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Value of the `Authorization` header.
    pub fn authorization(&self) -> String {
        let credentials = STANDARD.encode(format!("{}:api_token", self.api_token));
        format!("Basic {}", credentials)
    }

    /// Checks that the token is accepted.
    pub async fn test(&self) -> Result<(), AdapterError> {
        self.send(self.request(Method::GET, "/me")).await?;
        Ok(())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .header(reqwest::header::AUTHORIZATION, self.authorization())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
    }

    async fn send(&self, request: RequestBuilder) -> Result<Vec<u8>, AdapterError> {
        let response = request.send().await.map_err(|e| {
            tracing::debug!("Toggl request failed: {}", e);
            AdapterError::Unreachable(CONNECTION_FAILED.to_string())
        })?;

        if !response.status().is_success() {
            tracing::debug!("Toggl returned status {}", response.status());
            return Err(AdapterError::Unreachable(CONNECTION_FAILED.to_string()));
        }

        response
            .bytes()
            .await
            .map(|body| body.to_vec())
            .map_err(|_| AdapterError::Unreachable(CONNECTION_FAILED.to_string()))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, AdapterError> {
        let body = self.send(request).await?;
        serde_json::from_slice(&body).map_err(|e| {
            tracing::debug!("Failed to decode Toggl response: {}", e);
            AdapterError::UnexpectedResponse(UNEXPECTED_RESPONSE.to_string())
        })
    }

    async fn fetch_me(&self) -> Result<MeResponse, AdapterError> {
        self.send_json(self.request(Method::GET, "/me?with_related_data=true"))
            .await
    }
}

#[async_trait]
impl TrackerAdapter for TogglClient {
    async fn get_current_state(&self) -> Result<TrackerState, AdapterError> {
        Ok(self.fetch_me().await?.data.current_state())
    }

    async fn set_current_state(
        &self,
        project: Option<ProjectId>,
    ) -> Result<TrackerState, AdapterError> {
        let me = self.fetch_me().await?.data;
        let current = me.current_state();

        match project {
            None => match me.running_entry() {
                None => Ok(current),
                Some(entry) => {
                    let path = format!("/time_entries/{}/stop", entry.id);
                    self.send(self.request(Method::PUT, &path)).await?;
                    tracing::debug!(entry_id = entry.id, "stopped Toggl time entry");
                    Ok(TrackerState::idle())
                }
            },
            Some(project_id) if current.project_id == Some(project_id) => Ok(current),
            Some(project_id) => {
                let body = StartRequest {
                    time_entry: NewTimeEntry {
                        pid: Some(project_id.0),
                        created_with: CREATED_WITH,
                    },
                };
                let started: TimeEntryResponse = self
                    .send_json(self.request(Method::POST, "/time_entries/start").json(&body))
                    .await?;
                tracing::debug!(
                    entry_id = started.data.id,
                    project = %project_id,
                    "started Toggl time entry"
                );
                Ok(me.state_for(&started.data))
            }
        }
    }
}
