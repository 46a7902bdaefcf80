//! Short-lived vendor credentials.
//!
//! Every upstream call carries a fresh HS256 token; nothing is cached.

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::CredentialConfig;

/// Claims understood by the vendor API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Access key identifier.
    pub iss: String,
    /// Expiry, unix seconds.
    pub exp: u64,
    /// Not-before, unix seconds.
    pub nbf: u64,
}

/// Errors that can occur while signing a token.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// Signs bearer tokens from a static access key pair.
#[derive(Clone)]
pub struct CredentialSigner {
    access_key_id: String,
    key: EncodingKey,
    ttl_secs: u64,
    skew_secs: u64,
}

impl CredentialSigner {
    pub fn new(config: &CredentialConfig) -> Self {
        Self {
            access_key_id: config.access_key_id.clone(),
            key: EncodingKey::from_secret(config.access_key_secret.as_bytes()),
            ttl_secs: config.token_ttl_secs,
            skew_secs: config.not_before_skew_secs,
        }
    }

    /// Claims for a token issued at `now` (unix seconds).
    pub fn claims_at(&self, now: u64) -> Claims {
        Claims {
            iss: self.access_key_id.clone(),
            exp: now + self.ttl_secs,
            nbf: now.saturating_sub(self.skew_secs),
        }
    }

    /// Sign a token issued at `now`.
    pub fn sign_at(&self, now: u64) -> Result<String, CredentialError> {
        let header = Header::new(Algorithm::HS256);
        Ok(encode(&header, &self.claims_at(now), &self.key)?)
    }

    /// Sign a token issued right now.
    pub fn sign(&self) -> Result<String, CredentialError> {
        self.sign_at(jsonwebtoken::get_current_timestamp())
    }

    /// `Authorization` header value for a fresh token.
    pub fn bearer(&self) -> Result<String, CredentialError> {
        Ok(format!("Bearer {}", self.sign()?))
    }
}
