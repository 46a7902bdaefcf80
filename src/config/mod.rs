//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → environment overrides (KLING_ACCESS_KEY_ID, KLING_ACCESS_KEY_SECRET, KLING_API_BASE)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    CredentialConfig, ListenerConfig, LogFormat, ObservabilityConfig, PollerConfig, ProxyConfig,
    SecurityConfig, TimeoutConfig, UpstreamConfig,
};
