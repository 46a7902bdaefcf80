//! Signed HTTP client for the vendor image API.
//!
//! # Responsibilities
//! - Sign a fresh bearer token for every call
//! - Build vendor URLs for generation, expansion and task queries
//! - Return the vendor status and body untouched
//!
//! # Design Decisions
//! - No retries and no backoff: a failed call surfaces to the caller
//! - One total timeout per call

use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::http::{header, HeaderValue, Method, StatusCode};
use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::auth::{CredentialError, CredentialSigner};
use crate::config::{CredentialConfig, UpstreamConfig};
use crate::observability::metrics;
use crate::upstream::types::JobKind;

/// Errors that keep a vendor response from being produced.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("invalid upstream URL: {0}")]
    Url(String),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("upstream request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Vendor response as received.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

/// Pagination for task listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u32,
    pub size: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self { number: 1, size: 30 }
    }
}

/// Client for the vendor API.
#[derive(Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: Url,
    signer: CredentialSigner,
}

impl UpstreamClient {
    pub fn new(upstream: &UpstreamConfig, credentials: &CredentialConfig) -> Result<Self, UpstreamError> {
        let base_url = Url::parse(&upstream.base_url)
            .map_err(|e| UpstreamError::Url(format!("{}: {}", upstream.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(UpstreamError::Url(upstream.base_url.clone()));
        }

        let mut builder = reqwest::Client::builder().timeout(Duration::from_secs(upstream.timeout_secs));
        if !upstream.system_proxy {
            builder = builder.no_proxy();
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            base_url,
            signer: CredentialSigner::new(credentials),
        })
    }

    /// Vendor URL for a job family, optionally addressing one task.
    pub fn task_url(&self, kind: JobKind, task_id: Option<&str>) -> Result<Url, UpstreamError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| UpstreamError::Url(self.base_url.to_string()))?;
            segments.pop_if_empty().extend(kind.path_segments());
            if let Some(id) = task_id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    /// Submit a new job.
    pub async fn submit<B: Serialize>(&self, kind: JobKind, body: &B) -> Result<UpstreamResponse, UpstreamError> {
        let url = self.task_url(kind, None)?;
        let request = self.http.post(url).json(body);
        self.send(Method::POST, kind, request).await
    }

    /// Query one task.
    pub async fn query(&self, kind: JobKind, task_id: &str) -> Result<UpstreamResponse, UpstreamError> {
        let url = self.task_url(kind, Some(task_id))?;
        let request = self.http.get(url).header(header::CONTENT_TYPE, "application/json");
        self.send(Method::GET, kind, request).await
    }

    /// List recent tasks.
    pub async fn list(&self, kind: JobKind, page: Page) -> Result<UpstreamResponse, UpstreamError> {
        let mut url = self.task_url(kind, None)?;
        url.query_pairs_mut()
            .append_pair("pageNum", &page.number.to_string())
            .append_pair("pageSize", &page.size.to_string());
        let request = self.http.get(url).header(header::CONTENT_TYPE, "application/json");
        self.send(Method::GET, kind, request).await
    }

    async fn send(
        &self,
        method: Method,
        kind: JobKind,
        request: reqwest::RequestBuilder,
    ) -> Result<UpstreamResponse, UpstreamError> {
        let start = Instant::now();
        let response = request
            .header(header::AUTHORIZATION, self.signer.bearer()?)
            .send()
            .await
            .inspect_err(|_| metrics::record_upstream(method.as_str(), kind, None, start))?;

        let status = response.status();
        let content_type = response.headers().get(header::CONTENT_TYPE).cloned();
        let body = response.bytes().await?;

        metrics::record_upstream(method.as_str(), kind, Some(status.as_u16()), start);
        tracing::debug!(
            method = %method,
            kind = ?kind,
            status = %status,
            latency_ms = start.elapsed().as_millis() as u64,
            "Upstream responded"
        );

        Ok(UpstreamResponse {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> UpstreamClient {
        let upstream = UpstreamConfig {
            base_url: base.to_string(),
            ..UpstreamConfig::default()
        };
        UpstreamClient::new(&upstream, &CredentialConfig::default()).unwrap()
    }

    #[test]
    fn test_task_urls() {
        let c = client("https://api.klingai.com");
        assert_eq!(
            c.task_url(JobKind::Generate, None).unwrap().as_str(),
            "https://api.klingai.com/v1/images/generations"
        );
        assert_eq!(
            c.task_url(JobKind::Generate, Some("abc")).unwrap().as_str(),
            "https://api.klingai.com/v1/images/generations/abc"
        );
        assert_eq!(
            c.task_url(JobKind::Expand, Some("abc")).unwrap().as_str(),
            "https://api.klingai.com/v1/images/editing/expand/abc"
        );
    }

    #[test]
    fn test_task_id_is_escaped() {
        let c = client("http://127.0.0.1:9000/vendor/");
        assert_eq!(
            c.task_url(JobKind::Generate, Some("a/b?c")).unwrap().as_str(),
            "http://127.0.0.1:9000/vendor/v1/images/generations/a%2Fb%3Fc"
        );
    }

    #[test]
    fn test_rejects_non_base_url() {
        let upstream = UpstreamConfig {
            base_url: "mailto:someone@example.com".into(),
            ..UpstreamConfig::default()
        };
        assert!(matches!(
            UpstreamClient::new(&upstream, &CredentialConfig::default()),
            Err(UpstreamError::Url(_))
        ));
    }
}
