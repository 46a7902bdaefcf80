//! Configuration validation.
//!
//! Semantic checks that serde cannot express. Every problem is collected
//! so a misconfigured deployment is reported in one pass.

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// A single semantic configuration problem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid bind address '{0}'")]
    BindAddress(String),

    #[error("endpoint path '{0}' must start with '/'")]
    EndpointPath(String),

    #[error("invalid upstream base URL '{0}'")]
    BaseUrl(String),

    #[error("missing credential: {0}")]
    MissingCredential(&'static str),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),
}

/// Validate a loaded configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if !config.listener.endpoint_path.starts_with('/') {
        errors.push(ValidationError::EndpointPath(config.listener.endpoint_path.clone()));
    }

    match url::Url::parse(&config.upstream.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && !url.cannot_be_a_base() => {}
        _ => errors.push(ValidationError::BaseUrl(config.upstream.base_url.clone())),
    }

    if config.credentials.access_key_id.is_empty() {
        errors.push(ValidationError::MissingCredential("access_key_id"));
    }
    if config.credentials.access_key_secret.is_empty() {
        errors.push(ValidationError::MissingCredential("access_key_secret"));
    }

    let positive = [
        ("credentials.token_ttl_secs", config.credentials.token_ttl_secs),
        ("upstream.timeout_secs", config.upstream.timeout_secs),
        ("timeouts.request_secs", config.timeouts.request_secs),
        ("poller.interval_ms", config.poller.interval_ms),
        ("poller.max_attempts", u64::from(config.poller.max_attempts)),
        ("security.max_body_size", config.security.max_body_size as u64),
    ];
    for (name, value) in positive {
        if value == 0 {
            errors.push(ValidationError::Zero(name));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> ProxyConfig {
        let mut config = ProxyConfig::default();
        config.credentials.access_key_id = "ak".into();
        config.credentials.access_key_secret = "sk".into();
        config
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_missing_credentials_reported() {
        let errors = validate_config(&ProxyConfig::default()).unwrap_err();
        assert!(errors.contains(&ValidationError::MissingCredential("access_key_id")));
        assert!(errors.contains(&ValidationError::MissingCredential("access_key_secret")));
    }

    #[test]
    fn test_all_errors_collected() {
        let mut config = valid_config();
        config.listener.bind_address = "not-an-address".into();
        config.upstream.base_url = "ftp://example.com".into();
        config.poller.max_attempts = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::Zero("poller.max_attempts")));
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = valid_config();
        config.observability.metrics_address = "bogus".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::MetricsAddress("bogus".into())]
        );
    }
}
