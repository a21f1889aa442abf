//! HTTP client for the Reflect REST API.

use std::time::Duration;

use anyhow::Context;
use serde_json::Value;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://reflect.app/api";

/// Failures surfaced to tool callers. Two categories, matching what a
/// user can act on: the service answered with an error, or it was never
/// reached at all.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Reflect API error ({status}): {message}")]
    Status { status: u16, message: String },
    #[error("unable to reach Reflect: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Bearer-authenticated JSON client for the Reflect API.
#[derive(Debug, Clone)]
pub struct ReflectClient {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl ReflectClient {
    pub fn new(base_url: String, token: String, timeout_ms: u64) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .context("build reqwest client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get_json(&self, path: &str) -> Result<Value, ApiError> {
        self.execute(self.client.get(self.url(path))).await
    }

    pub async fn post_json(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        self.execute(self.client.post(self.url(path)).json(&body))
            .await
    }

    pub async fn put_json(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        self.execute(self.client.put(self.url(path)).json(&body))
            .await
    }

    async fn execute(&self, req: reqwest::RequestBuilder) -> Result<Value, ApiError> {
        let resp = req.bearer_auth(&self.token).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        let value = serde_json::from_str::<Value>(&text).unwrap_or(Value::Null);
        if !status.is_success() {
            let message = value
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                });
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(value)
    }
}

/// A [`ReflectClient`] scoped to one graph. All note resources live under
/// `/graphs/{id}/`.
#[derive(Debug, Clone)]
pub struct GraphClient {
    api: ReflectClient,
    graph_id: String,
}

impl GraphClient {
    pub fn new(api: ReflectClient, graph_id: String) -> Self {
        Self { api, graph_id }
    }

    pub fn graph_id(&self) -> &str {
        &self.graph_id
    }

    fn path(&self, resource: &str) -> String {
        format!("/graphs/{}/{}", self.graph_id, resource)
    }

    pub async fn get(&self, resource: &str) -> Result<Value, ApiError> {
        self.api.get_json(&self.path(resource)).await
    }

    pub async fn post(&self, resource: &str, body: Value) -> Result<Value, ApiError> {
        self.api.post_json(&self.path(resource), body).await
    }

    pub async fn put(&self, resource: &str, body: Value) -> Result<Value, ApiError> {
        self.api.put_json(&self.path(resource), body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed_from_base_url() {
        let client =
            ReflectClient::new("https://reflect.app/api/".to_string(), "t".to_string(), 1000)
                .unwrap();
        assert_eq!(client.url("/graphs/g1/links"), "https://reflect.app/api/graphs/g1/links");
    }

    #[test]
    fn graph_client_scopes_resources() {
        let api =
            ReflectClient::new(DEFAULT_BASE_URL.to_string(), "t".to_string(), 1000).unwrap();
        let graph = GraphClient::new(api, "g42".to_string());
        assert_eq!(graph.path("daily-notes"), "/graphs/g42/daily-notes");
    }

    #[test]
    fn status_error_displays_service_message() {
        let err = ApiError::Status {
            status: 404,
            message: "graph not found".to_string(),
        };
        assert_eq!(err.to_string(), "Reflect API error (404): graph not found");
    }
}
