//! HTTP server setup and request pipeline.
//!
//! # Responsibilities
//! - Create the Axum router and wire up middleware (request ID, limits, tracing)
//! - Hold the runtime snapshot (config, bindings, catalog, rewrite engine)
//! - Detect the language, apply the redirect policy, forward upstream
//! - Rewrite HTML bodies on the way back
//! - Swap the snapshot when a new configuration arrives
//!
//! # Design Decisions
//! - One snapshot per request; a reload never changes a request midway
//! - Listener-level limits (body size, concurrency, timeout) are fixed at startup
//! - Upstream failures become 502, never panics

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode, Uri, Version},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc, Semaphore};
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::bindings::{BindingsCache, BindingsRegistry, DomainResolver};
use crate::config::ProxyConfig;
use crate::http::error::ProxyError;
use crate::http::request::{self, MakeRequestUuid};
use crate::http::response;
use crate::language::{detect_language, DetectedLanguage, DetectionInput, LanguageCatalog};
use crate::observability::{metrics, DebugTrace};
use crate::redirect::{RedirectDecision, RedirectPolicy};
use crate::rewrite::{RenderPass, UrlRewriteEngine};

/// Everything a request needs, derived from one configuration.
#[derive(Debug)]
pub struct RuntimeState {
    pub config: ProxyConfig,
    pub registry: Arc<BindingsRegistry>,
    pub catalog: LanguageCatalog,
    pub engine: UrlRewriteEngine,
    /// `host:port` of the upstream site.
    pub upstream: String,
}

impl RuntimeState {
    pub fn build(config: ProxyConfig, cache: &BindingsCache) -> Result<Self, ProxyError> {
        let upstream = config.upstream.address.trim().to_string();
        if format!("http://{upstream}/").parse::<Uri>().is_err() {
            return Err(ProxyError::InvalidUpstream(upstream));
        }

        let registry = cache.get(&config.language.bindings);
        let catalog = LanguageCatalog::build(&config.language.languages, &registry);
        let engine = UrlRewriteEngine::new(&registry, &catalog, &config.language)?;

        Ok(Self {
            config,
            registry,
            catalog,
            engine,
            upstream,
        })
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<ArcSwap<RuntimeState>>,
    pub bindings: Arc<BindingsCache>,
    pub client: Client<HttpConnector, Body>,
    /// Bounds in-flight proxied requests to `listener.max_connections`.
    pub in_flight: Arc<Semaphore>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: ProxyConfig) -> Result<Self, ProxyError> {
        let bindings = Arc::new(BindingsCache::new());
        let in_flight = Arc::new(Semaphore::new(config.listener.max_connections.max(1)));
        let runtime = RuntimeState::build(config, &bindings)?;
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Ok(Self {
            runtime: Arc::new(ArcSwap::from_pointee(runtime)),
            bindings,
            client,
            in_flight,
            started_at: Instant::now(),
        })
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<RuntimeState> {
        self.runtime.load_full()
    }

    /// Replace the snapshot. The current one stays on error.
    pub fn apply(&self, config: ProxyConfig) -> Result<(), ProxyError> {
        let runtime = RuntimeState::build(config, &self.bindings)?;
        tracing::info!(
            bindings = runtime.registry.len(),
            languages = runtime.engine.languages().len(),
            enforce_domains = runtime.config.language.enforce_domains,
            "Runtime configuration applied"
        );
        self.runtime.store(Arc::new(runtime));
        Ok(())
    }
}

/// HTTP server for the language-domain proxy.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    pub fn new(config: ProxyConfig) -> Result<Self, ProxyError> {
        let state = AppState::new(config.clone())?;
        let router = Self::build_router(&config, state.clone());
        Ok(Self { router, state })
    }

    /// Shared state, for the admin router.
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Serve until `shutdown` fires, applying every config from `updates`.
    pub async fn run(
        self,
        listener: TcpListener,
        mut updates: mpsc::UnboundedReceiver<ProxyConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ProxyError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let state = self.state.clone();
        tokio::spawn(async move {
            while let Some(config) = updates.recv().await {
                if let Err(e) = state.apply(config) {
                    tracing::error!(error = %e, "Failed to apply new configuration, keeping current");
                }
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main proxy handler.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let Ok(_permit) = state.in_flight.clone().acquire_owned().await else {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    };

    let runtime = state.snapshot();
    let response = handle(&state, &runtime, request).await;
    metrics::record_request(response.status().as_u16());
    response
}

async fn handle(state: &AppState, runtime: &RuntimeState, request: Request<Body>) -> Response {
    let (mut parts, body) = request.into_parts();
    let request_id = request::request_id(&parts.headers).to_string();
    let settings = &runtime.config.language;

    let Some(origin) = request::origin(&parts, settings.assume_https) else {
        tracing::warn!(request_id = %request_id, "Request without a usable Host");
        return (StatusCode::BAD_REQUEST, "Missing Host header").into_response();
    };
    let current = request::current_request(&parts, &origin, &runtime.config.site.base_path);

    let path = parts.uri.path();
    let base = runtime.config.site.base_path.trim_end_matches('/');
    let site_path = path
        .strip_prefix(base)
        .filter(|rest| rest.is_empty() || rest.starts_with('/'))
        .unwrap_or(path);

    let detected = detect_language(
        DetectionInput {
            query: parts.uri.query(),
            path: site_path,
            host: &origin.host,
            default_language: &settings.default_language,
        },
        &DomainResolver::new(&runtime.registry),
        &runtime.catalog,
    );

    let eligible = current.facts.is_redirect_eligible();
    let mut trace = DebugTrace::new(
        eligible && (settings.debug || request::debug_requested(parts.uri.query())),
    );

    tracing::debug!(
        request_id = %request_id,
        method = %parts.method,
        url = %current.url,
        language = detected.as_ref().map(|d| d.tag.as_str()).unwrap_or("-"),
        "Proxying request"
    );

    if let Some(detected) = &detected {
        trace.message(format!("Current language: {} ({:?})", detected.tag, detected.source));

        let policy = RedirectPolicy::new(&runtime.registry, settings);
        if let RedirectDecision::Redirect(target) = policy.decide(&current, detected) {
            metrics::record_redirect(target.rule.as_str());
            if trace.is_enabled() {
                return response::debug_link(&target);
            }
            return response::redirect(&target, settings);
        }
    }

    let cookie_cleared = request::strip_cookie(&mut parts.headers, &settings.cookie_name);
    request::prepare_forward_headers(
        &mut parts.headers,
        &origin,
        detected.as_ref().map(|d| d.tag.as_str()),
    );

    let path_and_query = parts.uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let Ok(uri) = format!("http://{}{}", runtime.upstream, path_and_query).parse::<Uri>() else {
        return (StatusCode::BAD_GATEWAY, "Invalid upstream URI").into_response();
    };
    let method = parts.method.clone();
    parts.uri = uri;
    parts.version = Version::HTTP_11;

    let upstream_response: Response<Incoming> = match state.client.request(Request::from_parts(parts, body)).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(request_id = %request_id, upstream = %runtime.upstream, error = %e, "Upstream error");
            return (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response();
        }
    };

    let (mut resp_parts, resp_body) = upstream_response.into_parts();
    if cookie_cleared {
        response::append_expired_cookie(&mut resp_parts.headers, settings);
    }

    let skip_rewrite = method == Method::HEAD
        || matches!(resp_parts.status, StatusCode::NO_CONTENT | StatusCode::NOT_MODIFIED)
        || !response::is_rewritable_html(&resp_parts.headers)
        || (!runtime.engine.is_active() && !trace.is_enabled());
    if skip_rewrite {
        return Response::from_parts(resp_parts, Body::new(resp_body));
    }

    let bytes = match axum::body::to_bytes(Body::new(resp_body), runtime.config.security.max_body_size).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Failed to buffer upstream HTML");
            return (StatusCode::BAD_GATEWAY, "Upstream response unreadable").into_response();
        }
    };

    let html = match String::from_utf8(bytes.to_vec()) {
        Ok(html) => html,
        Err(e) => return response::with_body(resp_parts, e.into_bytes()),
    };

    rewrite_html(runtime, resp_parts, &html, detected.as_ref(), origin.https, trace)
}

fn rewrite_html(
    runtime: &RuntimeState,
    parts: axum::http::response::Parts,
    html: &str,
    detected: Option<&DetectedLanguage>,
    https: bool,
    mut trace: DebugTrace,
) -> Response {
    let pass = RenderPass {
        current_language: detected.map(|d| d.tag.as_str()),
        https,
    };
    let outcome = runtime.engine.rewrite(html, &pass, &mut trace);
    tracing::debug!(replaced = outcome.replaced, "Rewrote HTML body");

    let body = if trace.is_enabled() {
        trace.inject_into(&outcome.body)
    } else {
        outcome.body
    };
    response::with_body(parts, body.into_bytes())
}
