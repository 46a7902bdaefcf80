//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (assign request ID)
//!     → generate.rs (method dispatch, validation, reshaping)
//!     → upstream client (signed vendor call)
//!     → response.rs (relay vendor response or map local error)
//!     → Send to client
//! ```

pub mod generate;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::ApiError;
pub use server::{AppState, HttpServer};
