//! Client for the proxy's generation endpoint.
//!
//! Mirrors what a browser front-end does: submit a job, then poll the task
//! through the same endpoint until it produces an image.

use reqwest::Client;
use serde_json::Value;
use thiserror::Error;

use crate::config::PollerConfig;
use crate::poller::{PollError, TaskPoller, TaskSource};
use crate::upstream::{JobKind, Page, SubmitRequest, TaskEnvelope};

/// Default mount point of the generation endpoint.
pub const DEFAULT_ENDPOINT: &str = "/api/kling-generate";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("proxy rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("unexpected response ({status}): {source}")]
    Decode {
        status: u16,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone)]
pub struct ProxyClient {
    client: Client,
    endpoint: String,
}

impl ProxyClient {
    pub fn new(proxy_url: &str) -> Self {
        Self::with_endpoint(proxy_url, DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(proxy_url: &str, path: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!("{}{}", proxy_url.trim_end_matches('/'), path),
        }
    }

    /// Use a preconfigured reqwest client.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Submit a generation or expansion job.
    pub async fn submit(&self, request: &SubmitRequest) -> Result<TaskEnvelope, ClientError> {
        let resp = self.client.post(&self.endpoint).json(request).send().await?;
        let (status, value) = read_json(resp).await?;
        envelope(status, value)
    }

    /// Query one task.
    pub async fn task(&self, kind: JobKind, task_id: &str) -> Result<TaskEnvelope, ClientError> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[("task_id", task_id), ("type", kind.as_str())])
            .send()
            .await?;
        let (status, value) = read_json(resp).await?;
        envelope(status, value)
    }

    /// List tasks. The vendor list shape is returned untouched.
    pub async fn list(&self, kind: JobKind, page: Page) -> Result<Value, ClientError> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("list", "true".to_string()),
                ("type", kind.as_str().to_string()),
                ("page_num", page.number.to_string()),
                ("page_size", page.size.to_string()),
            ])
            .send()
            .await?;
        let (status, value) = read_json(resp).await?;
        reject_local_error(status, &value)?;
        Ok(value)
    }

    /// Submit a job and wait for its first image URL.
    pub async fn generate(&self, request: &SubmitRequest, poller: &PollerConfig) -> Result<String, PollError> {
        let kind = request.kind;
        let submitted = self.submit(request).await?;
        let task_id = crate::poller::submitted_task_id(&submitted)?;
        tracing::info!(task_id = %task_id, kind = ?kind, "Task submitted");

        TaskPoller::new(self, poller).wait(kind, &task_id).await
    }
}

#[async_trait::async_trait]
impl TaskSource for ProxyClient {
    async fn fetch_task(&self, kind: JobKind, task_id: &str) -> Result<TaskEnvelope, ClientError> {
        self.task(kind, task_id).await
    }
}

async fn read_json(resp: reqwest::Response) -> Result<(u16, Value), ClientError> {
    let status = resp.status().as_u16();
    let text = resp.text().await?;
    let value = serde_json::from_str(&text).map_err(|source| ClientError::Decode { status, source })?;
    Ok((status, value))
}

/// Local proxy errors carry `{"error": ...}`; vendor errors carry an envelope.
fn reject_local_error(status: u16, value: &Value) -> Result<(), ClientError> {
    match value.get("error").and_then(Value::as_str) {
        Some(message) if !(200..300).contains(&status) => Err(ClientError::Rejected {
            status,
            message: message.to_string(),
        }),
        _ => Ok(()),
    }
}

fn envelope(status: u16, value: Value) -> Result<TaskEnvelope, ClientError> {
    reject_local_error(status, &value)?;
    serde_json::from_value(value).map_err(|source| ClientError::Decode { status, source })
}
