//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!     → trace.rs (per-request debug trace, optionally injected into HTML)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through all log events via the trace layer span
//! - Debug trace only exists for the lifetime of one request

pub mod logging;
pub mod metrics;
pub mod trace;

pub use trace::{DebugTrace, TraceLine};
