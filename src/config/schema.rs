//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Deserializer, Serialize};

/// Root configuration for the language-domain proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, connection limit).
    pub listener: ListenerConfig,

    /// The site being fronted.
    pub upstream: UpstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Site layout as seen by visitors.
    pub site: SiteConfig,

    /// Domain bindings and rewrite/redirect policy.
    pub language: LanguageConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    pub admin: AdminConfig,

    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum concurrent requests (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 10_000,
        }
    }
}

/// Upstream site configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream address (e.g., "127.0.0.1:3000").
    pub address: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Path the site is mounted under (e.g., "/" or "/cms/").
    pub base_path: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_path: "/".to_string(),
        }
    }
}

/// A language of the site with its SEF code.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct LanguageEntry {
    /// Language tag (e.g., "en-GB").
    pub tag: String,

    /// Short code used in URL paths (e.g., "en").
    pub sef: String,
}

/// Domain binding and rewrite/redirect settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LanguageConfig {
    /// Line-oriented binding table: `tag=primary|secondary|...`.
    pub bindings: String,

    /// Canonicalize links and redirects onto each language's primary domain.
    pub enforce_domains: bool,

    /// Render redirect targets as links and inject a console trace into pages.
    pub debug: bool,

    /// Component names whose URLs are never rewritten.
    #[serde(deserialize_with = "string_or_list")]
    pub exclude_components: Vec<String>,

    /// URL substrings that are never rewritten.
    #[serde(deserialize_with = "string_or_list")]
    pub exclude_urls: Vec<String>,

    /// Site uses URL rewriting (no `index.php/` in paths).
    pub sef_rewrite: bool,

    /// Tag used when nothing in the request identifies a language.
    pub default_language: String,

    /// Language catalog. Bound tags missing here get a derived SEF code.
    pub languages: Vec<LanguageEntry>,

    /// Treat requests without `X-Forwarded-Proto` as HTTPS.
    pub assume_https: bool,

    /// Status code used for cross-domain redirects.
    pub redirect_status: u16,

    /// Name of the language-selection cookie to clear.
    pub cookie_name: String,

    pub cookie_path: String,

    pub cookie_domain: Option<String>,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            bindings: String::new(),
            enforce_domains: false,
            debug: false,
            exclude_components: Vec::new(),
            exclude_urls: Vec::new(),
            sef_rewrite: true,
            default_language: String::new(),
            languages: Vec::new(),
            assume_https: false,
            redirect_status: 303,
            cookie_name: "language".to_string(),
            cookie_path: "/".to_string(),
            cookie_domain: None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes, for requests and for buffered HTML responses.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 8 * 1024 * 1024, // 8MB
        }
    }
}

/// Accept `"a, b"` as well as `["a", "b"]`.
fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrList {
        String(String),
        List(Vec<String>),
    }

    let items = match StringOrList::deserialize(deserializer)? {
        StringOrList::String(s) => s.split(',').map(str::to_string).collect(),
        StringOrList::List(list) => list,
    };

    Ok(items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}
