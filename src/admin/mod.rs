//! Admin API, served on its own listener.
//!
//! - `GET /admin/status`: version, uptime, bound languages
//! - `GET /admin/bindings`: parsed bindings and every known domain
//! - `GET /admin/resolve?domain=..`: language and primary domain for a host

pub mod auth;
pub mod handlers;

use axum::{middleware, routing::get, Router};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::AppState;

pub fn setup_admin_router(state: AppState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/bindings", get(get_bindings))
        .route("/admin/resolve", get(resolve_domain))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}
