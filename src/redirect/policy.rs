//! Cross-domain redirect decisions.
//!
//! # Rules
//! - LanguageToDomain: an explicitly selected language is served from its
//!   primary domain; the language cookie is cleared on the way
//! - DomainToPrimaryDomain (enforce_domains only): secondary hosts and
//!   `www.` variants collapse onto the owning primary domain
//!
//! # Design Decisions
//! - Decisions are pure; the HTTP layer performs the redirect
//! - No computable target means no redirect, never an error
//! - Applying a decision to its own target never redirects again

use serde::Serialize;

use crate::bindings::{BindingsRegistry, DomainResolver};
use crate::config::LanguageConfig;
use crate::filter::RequestFacts;
use crate::language::DetectedLanguage;
use crate::rewrite::url::primary_url;

/// The inbound request as the policy sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentRequest {
    /// `scheme://authority/path`, query excluded, host lower-cased.
    pub url: String,
    /// `scheme://authority` + site base path, with trailing slash.
    pub base_url: String,
    /// Lower-cased host without port.
    pub host: String,
    pub https: bool,
    pub facts: RequestFacts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectRule {
    LanguageToDomain,
    DomainToPrimaryDomain,
}

impl RedirectRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedirectRule::LanguageToDomain => "language_to_domain",
            RedirectRule::DomainToPrimaryDomain => "domain_to_primary_domain",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedirectTarget {
    pub url: String,
    pub rule: RedirectRule,
    /// The host should expire the language-selection cookie.
    pub clear_language_cookie: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RedirectDecision {
    Proceed,
    Redirect(RedirectTarget),
}

impl RedirectDecision {
    pub fn target(&self) -> Option<&RedirectTarget> {
        match self {
            RedirectDecision::Proceed => None,
            RedirectDecision::Redirect(target) => Some(target),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RedirectPolicy<'a> {
    resolver: DomainResolver<'a>,
    enforce_domains: bool,
    sef_rewrite: bool,
}

impl<'a> RedirectPolicy<'a> {
    pub fn new(registry: &'a BindingsRegistry, settings: &LanguageConfig) -> Self {
        Self {
            resolver: DomainResolver::new(registry),
            enforce_domains: settings.enforce_domains,
            sef_rewrite: settings.sef_rewrite,
        }
    }

    /// Host-facing entry point: LanguageToDomain for explicit selections,
    /// then DomainToPrimaryDomain.
    pub fn decide(&self, request: &CurrentRequest, detected: &DetectedLanguage) -> RedirectDecision {
        if detected.source.is_explicit() {
            let decision = self.language_to_domain(request, &detected.tag);
            if decision != RedirectDecision::Proceed {
                return decision;
            }
        }
        self.domain_to_primary_domain(request, &detected.tag)
    }

    /// Send the visitor to the primary domain bound to `language_tag`.
    pub fn language_to_domain(&self, request: &CurrentRequest, language_tag: &str) -> RedirectDecision {
        if !request.facts.is_redirect_eligible() {
            return RedirectDecision::Proceed;
        }

        let Some(domain) = self.resolver.primary_domain_for_language(language_tag) else {
            return RedirectDecision::Proceed;
        };

        if contains_ignore_case(&request.url, domain) {
            return RedirectDecision::Proceed;
        }

        let target = primary_url(domain, request.https, self.sef_rewrite);
        let Some(remainder) = request.url.strip_prefix(request.base_url.as_str()) else {
            return RedirectDecision::Proceed;
        };
        let remainder = if target.ends_with("index.php/") {
            remainder.strip_prefix("index.php/").unwrap_or(remainder)
        } else {
            remainder
        };

        redirect(
            format!("{target}{remainder}"),
            request,
            RedirectRule::LanguageToDomain,
            true,
        )
    }

    /// With `enforce_domains`, move secondary hosts onto their primary domain.
    pub fn domain_to_primary_domain(&self, request: &CurrentRequest, language_tag: &str) -> RedirectDecision {
        if !self.enforce_domains || !request.facts.is_redirect_eligible() {
            return RedirectDecision::Proceed;
        }

        let primary = self
            .resolver
            .primary_for_secondary(&request.host)
            .or_else(|| self.resolver.primary_domain_for_language(language_tag));
        let Some(primary) = primary.filter(|p| !p.is_empty()) else {
            return RedirectDecision::Proceed;
        };

        if contains_ignore_case(&request.url, &format!("://{primary}")) {
            return RedirectDecision::Proceed;
        }

        let url = request.url.replacen(request.host.as_str(), &primary.to_ascii_lowercase(), 1);
        redirect(url, request, RedirectRule::DomainToPrimaryDomain, false)
    }
}

fn redirect(url: String, request: &CurrentRequest, rule: RedirectRule, clear_language_cookie: bool) -> RedirectDecision {
    if url == request.url {
        return RedirectDecision::Proceed;
    }

    tracing::info!(from = %request.url, to = %url, rule = rule.as_str(), "Redirect decided");
    RedirectDecision::Redirect(RedirectTarget {
        url,
        rule,
        clear_language_cookie,
    })
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack
        .to_ascii_lowercase()
        .contains(&needle.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::LanguageSource;

    const BINDINGS: &str = "en=en.example.com|m.en.example.com\nfr=fr.example.com";

    fn request(host: &str, path: &str) -> CurrentRequest {
        CurrentRequest {
            url: format!("http://{host}{path}"),
            base_url: format!("http://{host}/"),
            host: host.to_string(),
            https: false,
            facts: RequestFacts::get(),
        }
    }

    fn settings(enforce_domains: bool) -> LanguageConfig {
        LanguageConfig {
            bindings: BINDINGS.to_string(),
            enforce_domains,
            ..LanguageConfig::default()
        }
    }

    fn target(decision: RedirectDecision) -> RedirectTarget {
        decision.target().cloned().expect("expected a redirect")
    }

    #[test]
    fn test_language_to_domain_redirects() {
        let registry = BindingsRegistry::parse(BINDINGS);
        let policy = RedirectPolicy::new(&registry, &settings(false));

        let t = target(policy.language_to_domain(&request("www.example.com", "/fr/contact"), "fr"));
        assert_eq!(t.url, "http://fr.example.com/fr/contact");
        assert_eq!(t.rule, RedirectRule::LanguageToDomain);
        assert!(t.clear_language_cookie);
    }

    #[test]
    fn test_language_to_domain_noops() {
        let registry = BindingsRegistry::parse(BINDINGS);
        let policy = RedirectPolicy::new(&registry, &settings(false));

        // already there
        let req = request("fr.example.com", "/contact");
        assert_eq!(policy.language_to_domain(&req, "fr"), RedirectDecision::Proceed);
        // unbound language
        let req = request("www.example.com", "/");
        assert_eq!(policy.language_to_domain(&req, "de"), RedirectDecision::Proceed);
        // outside the site base
        let mut req = request("www.example.com", "/other/x");
        req.base_url = "http://www.example.com/cms/".into();
        assert_eq!(policy.language_to_domain(&req, "fr"), RedirectDecision::Proceed);
    }

    #[test]
    fn test_language_to_domain_without_url_rewriting() {
        let registry = BindingsRegistry::parse(BINDINGS);
        let mut settings = settings(false);
        settings.sef_rewrite = false;
        let policy = RedirectPolicy::new(&registry, &settings);

        let t = target(policy.language_to_domain(&request("www.example.com", "/index.php/fr/x"), "fr"));
        assert_eq!(t.url, "http://fr.example.com/index.php/fr/x");
    }

    #[test]
    fn test_domain_to_primary_requires_enforce() {
        let registry = BindingsRegistry::parse(BINDINGS);
        let policy = RedirectPolicy::new(&registry, &settings(false));
        let req = request("m.en.example.com", "/about");
        assert_eq!(policy.domain_to_primary_domain(&req, "en"), RedirectDecision::Proceed);
    }

    #[test]
    fn test_domain_to_primary_from_secondary() {
        let registry = BindingsRegistry::parse(BINDINGS);
        let policy = RedirectPolicy::new(&registry, &settings(true));

        let t = target(policy.domain_to_primary_domain(&request("m.en.example.com", "/about"), "fr"));
        assert_eq!(t.url, "http://en.example.com/about");
        assert_eq!(t.rule, RedirectRule::DomainToPrimaryDomain);
        assert!(!t.clear_language_cookie);
    }

    #[test]
    fn test_domain_to_primary_from_www_and_idempotent() {
        let registry = BindingsRegistry::parse(BINDINGS);
        let policy = RedirectPolicy::new(&registry, &settings(true));

        let t = target(policy.domain_to_primary_domain(&request("www.fr.example.com", "/x"), "fr"));
        assert_eq!(t.url, "http://fr.example.com/x");

        let again = request("fr.example.com", "/x");
        assert_eq!(again.url, t.url);
        assert_eq!(policy.domain_to_primary_domain(&again, "fr"), RedirectDecision::Proceed);
    }

    #[test]
    fn test_ineligible_requests_never_redirect() {
        let registry = BindingsRegistry::parse(BINDINGS);
        let policy = RedirectPolicy::new(&registry, &settings(true));

        let mut req = request("m.en.example.com", "/about");
        req.facts.response_format = Some("json".into());
        assert_eq!(policy.domain_to_primary_domain(&req, "en"), RedirectDecision::Proceed);
        assert_eq!(policy.language_to_domain(&req, "fr"), RedirectDecision::Proceed);

        let mut req = request("m.en.example.com", "/about");
        req.facts.is_ajax = true;
        assert_eq!(policy.domain_to_primary_domain(&req, "en"), RedirectDecision::Proceed);
    }

    #[test]
    fn test_empty_bindings_never_redirect() {
        let registry = BindingsRegistry::default();
        let mut settings = settings(true);
        settings.bindings.clear();
        let policy = RedirectPolicy::new(&registry, &settings);
        let req = request("m.en.example.com", "/about");

        assert_eq!(policy.language_to_domain(&req, "en"), RedirectDecision::Proceed);
        assert_eq!(policy.domain_to_primary_domain(&req, "en"), RedirectDecision::Proceed);
    }

    #[test]
    fn test_decide_only_moves_explicit_selections() {
        let registry = BindingsRegistry::parse(BINDINGS);
        let policy = RedirectPolicy::new(&registry, &settings(false));
        let req = request("en.example.com", "/");

        let explicit = DetectedLanguage {
            tag: "fr".into(),
            source: LanguageSource::Query,
        };
        assert_eq!(target(policy.decide(&req, &explicit)).url, "http://fr.example.com/");

        let inherited = DetectedLanguage {
            tag: "fr".into(),
            source: LanguageSource::Default,
        };
        assert_eq!(policy.decide(&req, &inherited), RedirectDecision::Proceed);
    }
}
