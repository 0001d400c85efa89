//! Current-language detection for an inbound request.
//!
//! Order: `language` query → `lang` query → SEF path segment → domain → default.

use serde::Serialize;

use crate::bindings::DomainResolver;
use crate::language::catalog::LanguageCatalog;

/// Where the current language came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageSource {
    Query,
    Path,
    Domain,
    Default,
}

impl LanguageSource {
    /// The visitor asked for this language rather than inheriting it from the host.
    pub fn is_explicit(&self) -> bool {
        matches!(self, LanguageSource::Query | LanguageSource::Path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectedLanguage {
    pub tag: String,
    pub source: LanguageSource,
}

/// Inputs describing the request, borrowed from the host.
#[derive(Debug, Clone, Copy)]
pub struct DetectionInput<'a> {
    pub query: Option<&'a str>,
    pub path: &'a str,
    pub host: &'a str,
    pub default_language: &'a str,
}

pub fn detect_language(
    input: DetectionInput<'_>,
    resolver: &DomainResolver<'_>,
    catalog: &LanguageCatalog,
) -> Option<DetectedLanguage> {
    let found = |tag: &str, source| {
        Some(DetectedLanguage {
            tag: tag.to_string(),
            source,
        })
    };

    if let Some(query) = input.query {
        let pairs: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();

        let param = |name: &str| {
            pairs
                .iter()
                .find(|(k, v)| k == name && !v.is_empty())
                .map(|(_, v)| v.replace('_', "-"))
        };

        if let Some(tag) = param("language").filter(|t| catalog.contains_tag(t)) {
            return found(&tag, LanguageSource::Query);
        }

        if let Some(lang) = param("lang") {
            if let Some(tag) = catalog.tag_for_sef(&lang) {
                return found(tag, LanguageSource::Query);
            }
            if catalog.contains_tag(&lang) {
                return found(&lang, LanguageSource::Query);
            }
        }
    }

    let segment = input
        .path
        .split('/')
        .filter(|s| !s.is_empty())
        .find(|s| *s != "index.php");
    if let Some(tag) = segment.and_then(|s| catalog.tag_for_sef(s)) {
        return found(tag, LanguageSource::Path);
    }

    if let Some(tag) = resolver.language_for_domain(input.host) {
        return found(tag, LanguageSource::Domain);
    }

    let default = input.default_language.trim();
    if default.is_empty() {
        return None;
    }
    found(default, LanguageSource::Default)
}
