//! Vendor image API integration.
//!
//! # Data Flow
//! ```text
//! SubmitRequest (client JSON)
//!     → types.rs (validate, concatenate style, apply defaults)
//!     → GenerationBody | ExpansionBody
//!     → client.rs (sign token, POST/GET vendor endpoint)
//!     → UpstreamResponse (status + body, untouched)
//! ```

pub mod client;
pub mod types;

pub use client::{Page, UpstreamClient, UpstreamError, UpstreamResponse};
pub use types::{
    AspectRatio, ExpansionBody, GenerationBody, GenerationDefaults, ImageReference, JobKind,
    RequestError, Resolution, SubmitRequest, TaskData, TaskEnvelope, TaskImage, TaskResult,
    TaskState,
};
