//! Exclusion filters.
//!
//! # Responsibilities
//! - Decide whether a URL found in markup may be rewritten (url.rs)
//! - Decide whether a request may be redirected at all (request.rs)
//!
//! # Design Decisions
//! - Checks are order-independent; any single match excludes
//! - Substring checks are case-insensitive, suffix/format checks are not
//! - Non-browser traffic (POST, AJAX, API formats) is never redirected

pub mod request;
pub mod url;

pub use request::{is_redirect_eligible, RequestFacts};
pub use url::{is_url_eligible, ExclusionRules, ALWAYS_EXCLUDED_URLS};
