//! Lookups over a parsed registry.

use crate::bindings::registry::BindingsRegistry;

/// Read-only view answering domain/language questions.
#[derive(Debug, Clone, Copy)]
pub struct DomainResolver<'a> {
    registry: &'a BindingsRegistry,
}

impl<'a> DomainResolver<'a> {
    pub fn new(registry: &'a BindingsRegistry) -> Self {
        Self { registry }
    }

    /// Every primary and secondary domain, in registry order.
    ///
    /// Duplicates are kept; callers only test membership.
    pub fn all_domains(&self) -> Vec<&'a str> {
        let mut domains = Vec::new();
        for binding in self.registry.iter() {
            domains.push(binding.primary_domain.as_str());
            domains.extend(binding.secondary_domains.iter().map(String::as_str));
        }
        domains
    }

    pub fn is_known_domain(&self, domain: &str) -> bool {
        self.registry.iter().any(|b| {
            b.primary_domain == domain || b.secondary_domains.iter().any(|d| d == domain)
        })
    }

    /// Language owning `domain`: primary (with or without `www.`) first,
    /// then the first binding listing it as secondary.
    pub fn language_for_domain(&self, domain: &str) -> Option<&'a str> {
        self.registry
            .iter()
            .find(|b| {
                b.primary_domain == domain
                    || domain
                        .strip_prefix("www.")
                        .is_some_and(|bare| bare == b.primary_domain)
            })
            .or_else(|| {
                self.registry
                    .iter()
                    .find(|b| b.secondary_domains.iter().any(|d| d == domain))
            })
            .map(|b| b.language_tag.as_str())
    }

    pub fn primary_domain_for_language(&self, language_tag: &str) -> Option<&'a str> {
        self.registry
            .get(language_tag)
            .map(|b| b.primary_domain.as_str())
    }

    pub fn secondary_domains_for_language(&self, language_tag: &str) -> Option<&'a [String]> {
        self.registry
            .get(language_tag)
            .map(|b| b.secondary_domains.as_slice())
    }

    /// Primary domain of the first binding that lists `domain` as secondary.
    pub fn primary_for_secondary(&self, domain: &str) -> Option<&'a str> {
        self.registry
            .iter()
            .find(|b| b.secondary_domains.iter().any(|d| d == domain))
            .map(|b| b.primary_domain.as_str())
    }
}
