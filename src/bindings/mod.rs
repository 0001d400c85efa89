//! Domain/language binding subsystem.
//!
//! # Data Flow
//! ```text
//! raw bindings string (config)
//!     → registry.rs (line parser, permissive)
//!     → cache.rs (memoized by raw string, shared via Arc)
//!     → resolver.rs (domain ⇄ language lookups)
//! ```
//!
//! # Design Decisions
//! - Parsing is total: typos degrade to "language not bound"
//! - Registry is immutable after construction
//! - Empty registry disables every rewrite and redirect

pub mod cache;
pub mod registry;
pub mod resolver;

pub use cache::BindingsCache;
pub use registry::{Binding, BindingsRegistry, SkipReason, SkippedLine};
pub use resolver::DomainResolver;
