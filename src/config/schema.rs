//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::upstream::types::AspectRatio;

/// Root configuration for the image proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, endpoint path).
    pub listener: ListenerConfig,

    /// Vendor API settings.
    pub upstream: UpstreamConfig,

    /// Access key pair and token lifetime.
    pub credentials: CredentialConfig,

    /// Task polling settings used by the client side.
    pub poller: PollerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Request hardening.
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Path the generation endpoint is mounted on.
    pub endpoint_path: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            endpoint_path: "/api/kling-generate".to_string(),
        }
    }
}

/// Vendor API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Vendor base URL.
    pub base_url: String,

    /// Model used when the client does not name one.
    pub default_model: String,

    /// Aspect ratio used when the client sends none and none can be detected.
    pub default_aspect_ratio: AspectRatio,

    /// Total timeout for a single vendor call in seconds.
    pub timeout_secs: u64,

    /// Honour `HTTP_PROXY`/`HTTPS_PROXY` for vendor calls.
    pub system_proxy: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.klingai.com".to_string(),
            default_model: "kling-v1".to_string(),
            default_aspect_ratio: AspectRatio::Square,
            timeout_secs: 30,
            system_proxy: true,
        }
    }
}

/// Access key pair used to sign vendor tokens.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CredentialConfig {
    /// Access key identifier, becomes the `iss` claim.
    pub access_key_id: String,

    /// Shared signing secret.
    #[serde(skip_serializing)]
    pub access_key_secret: String,

    /// Token lifetime in seconds.
    pub token_ttl_secs: u64,

    /// Seconds subtracted from `now` for the `nbf` claim (clock skew allowance).
    pub not_before_skew_secs: u64,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            access_key_id: String::new(),
            access_key_secret: String::new(),
            token_ttl_secs: 1800,
            not_before_skew_secs: 5,
        }
    }
}

impl std::fmt::Debug for CredentialConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialConfig")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"<redacted>")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("not_before_skew_secs", &self.not_before_skew_secs)
            .finish()
    }
}

/// Task polling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollerConfig {
    /// Delay between two status queries in milliseconds.
    pub interval_ms: u64,

    /// Number of status queries before giving up.
    pub max_attempts: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_ms: 2000,
            max_attempts: 30,
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 60 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes. Reference images arrive base64 encoded.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 10 * 1024 * 1024,
        }
    }
}
