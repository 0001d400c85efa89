use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::bindings::{BindingsRegistry, DomainResolver};
use crate::http::server::AppState;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub uptime_secs: u64,
    pub bindings: usize,
    pub languages: Vec<String>,
    pub enforce_domains: bool,
    pub debug: bool,
}

#[derive(Serialize)]
pub struct BindingsView {
    pub bindings: BindingsRegistry,
    pub domains: Vec<String>,
}

#[derive(Deserialize)]
pub struct ResolveParams {
    pub domain: String,
}

#[derive(Serialize)]
pub struct Resolution {
    pub domain: String,
    pub language: Option<String>,
    pub primary_domain: Option<String>,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    let runtime = state.snapshot();

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        uptime_secs: state.started_at.elapsed().as_secs(),
        bindings: runtime.registry.len(),
        languages: runtime.engine.languages().iter().map(|l| l.tag.clone()).collect(),
        enforce_domains: runtime.config.language.enforce_domains,
        debug: runtime.config.language.debug,
    })
}

pub async fn get_bindings(State(state): State<AppState>) -> Json<BindingsView> {
    let runtime = state.snapshot();
    let domains = DomainResolver::new(&runtime.registry)
        .all_domains()
        .into_iter()
        .map(str::to_string)
        .collect();

    Json(BindingsView {
        bindings: runtime.registry.as_ref().clone(),
        domains,
    })
}

pub async fn resolve_domain(
    State(state): State<AppState>,
    Query(params): Query<ResolveParams>,
) -> Json<Resolution> {
    let runtime = state.snapshot();
    let resolver = DomainResolver::new(&runtime.registry);
    let domain = params.domain.trim().to_ascii_lowercase();

    let language = resolver.language_for_domain(&domain);
    let primary_domain = resolver
        .primary_for_secondary(&domain)
        .or_else(|| language.and_then(|tag| resolver.primary_domain_for_language(tag)));

    Json(Resolution {
        language: language.map(str::to_string),
        primary_domain: primary_domain.map(str::to_string),
        domain,
    })
}
