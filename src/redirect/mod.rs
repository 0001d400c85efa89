//! Redirect subsystem.
//!
//! # Data Flow
//! ```text
//! CurrentRequest + detected language
//!     → filter::request (eligibility)
//!     → policy.rs (LanguageToDomain, DomainToPrimaryDomain)
//!     → RedirectDecision::Proceed | Redirect(target)
//!     → http::response (30x, or debug link)
//! ```

pub mod policy;

pub use policy::{CurrentRequest, RedirectDecision, RedirectPolicy, RedirectRule, RedirectTarget};
