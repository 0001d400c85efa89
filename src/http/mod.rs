//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, runtime snapshot)
//!     → request.rs (request ID, origin, CurrentRequest, RequestFacts)
//!     → language detection + redirect policy
//!         → response.rs (30x / debug link)
//!     → upstream site (hyper-util client)
//!     → response.rs (HTML check) → rewrite engine → client
//! ```

pub mod error;
pub mod request;
pub mod response;
pub mod server;

pub use error::ProxyError;
pub use request::{MakeRequestUuid, Origin, X_REQUEST_ID};
pub use server::{AppState, HttpServer, RuntimeState};
