//! Outbound rewrite subsystem.
//!
//! # Data Flow
//! ```text
//! rendered HTML body
//!     → engine.rs (per bound language, in catalog order)
//!         → patterns.rs: short → short+index → absolute → sef query
//!         → filter::url (eligibility per match)
//!         → url.rs (primary URL for the language)
//!     → rewritten body
//! ```
//!
//! # Design Decisions
//! - Text substitution on exact matched spans, not HTML-aware rewriting
//! - Each shape is an independent scan so it can be tested alone
//! - Short links are rewritten without verifying a domain; absolute links
//!   only when their host is a bound domain

pub mod engine;
pub mod patterns;
pub mod url;

pub use engine::{BoundLanguage, RenderPass, RewriteOutcome, UrlRewriteEngine};
pub use patterns::{LanguagePatterns, RewriteMatch, UrlShape};
pub use url::{domain_from_url, primary_url};
