//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable holding the access key identifier.
pub const ENV_ACCESS_KEY_ID: &str = "KLING_ACCESS_KEY_ID";
/// Environment variable holding the signing secret.
pub const ENV_ACCESS_KEY_SECRET: &str = "KLING_ACCESS_KEY_SECRET";
/// Environment variable overriding the vendor base URL.
pub const ENV_API_BASE: &str = "KLING_API_BASE";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file, apply environment
/// overrides, then validate.
pub fn load_config(path: Option<&Path>) -> Result<ProxyConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => ProxyConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay secrets and the base URL from the environment.
///
/// `lookup` abstracts the environment so callers can supply their own source.
pub fn apply_env_overrides<F>(config: &mut ProxyConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(id) = lookup(ENV_ACCESS_KEY_ID) {
        config.credentials.access_key_id = id;
    }
    if let Some(secret) = lookup(ENV_ACCESS_KEY_SECRET) {
        config.credentials.access_key_secret = secret;
    }
    if let Some(base) = lookup(ENV_API_BASE) {
        config.upstream.base_url = base;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = ProxyConfig::default();
        config.credentials.access_key_id = "from-file".into();

        let env: HashMap<&str, &str> = [
            (ENV_ACCESS_KEY_ID, "from-env"),
            (ENV_ACCESS_KEY_SECRET, "secret"),
        ]
        .into_iter()
        .collect();
        apply_env_overrides(&mut config, |k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.credentials.access_key_id, "from-env");
        assert_eq!(config.credentials.access_key_secret, "secret");
        assert_eq!(config.upstream.base_url, "https://api.klingai.com");
    }

    #[test]
    fn test_validation_error_message_lists_everything() {
        let err = ConfigError::Validation(vec![
            ValidationError::MissingCredential("access_key_id"),
            ValidationError::Zero("poller.max_attempts"),
        ]);
        assert_eq!(
            err.to_string(),
            "Validation failed: missing credential: access_key_id, poller.max_attempts must be greater than zero"
        );
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config(Some(Path::new("/nonexistent/kling-proxy.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
