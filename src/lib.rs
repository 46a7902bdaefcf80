//! Signing proxy and task poller for the Kling image generation API.

pub mod auth;
pub mod client;
pub mod config;
pub mod http;
pub mod imaging;
pub mod lifecycle;
pub mod observability;
pub mod poller;
pub mod upstream;

pub use client::ProxyClient;
pub use config::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use poller::{PollError, TaskPoller};
