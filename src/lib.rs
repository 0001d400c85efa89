//! Language-domain proxy library.
//!
//! Binds each site language to a primary domain (plus secondary domains),
//! rewrites language-prefixed links in rendered HTML onto those domains and
//! redirects visitors whose explicit language choice belongs elsewhere.
//!
//! The core (`bindings`, `filter`, `language`, `rewrite`, `redirect`) is
//! synchronous and host-agnostic. `http`, `admin` and `lifecycle` wrap it in
//! a reverse proxy.

pub mod admin;
pub mod bindings;
pub mod config;
pub mod filter;
pub mod http;
pub mod language;
pub mod lifecycle;
pub mod observability;
pub mod redirect;
pub mod rewrite;

pub use bindings::{Binding, BindingsCache, BindingsRegistry, DomainResolver};
pub use config::schema::ProxyConfig;
pub use http::{HttpServer, ProxyError};
pub use lifecycle::Shutdown;
pub use redirect::{CurrentRequest, RedirectDecision, RedirectPolicy};
pub use rewrite::{RenderPass, UrlRewriteEngine};
