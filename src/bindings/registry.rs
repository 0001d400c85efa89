//! Parsing of the line-oriented domain binding table.
//!
//! # Grammar
//! ```text
//! en-GB=en.example.com|m.en.example.com
//! fr_FR=fr.example.com
//! ```
//! One binding per line: `language=primary[|secondary...]`.
//!
//! # Design Decisions
//! - Parsing never fails; malformed lines are skipped
//! - Registry order is the order of first appearance of each tag
//! - A later duplicate tag overwrites the earlier entry in place

use serde::Serialize;

/// Domains bound to one language tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Binding {
    /// Normalized language tag (`_` replaced by `-`).
    pub language_tag: String,

    /// Canonical host for this language. No scheme, no trailing slash.
    pub primary_domain: String,

    /// Alternate hosts serving the same language.
    pub secondary_domains: Vec<String>,
}

/// Why a bindings line was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// No `=` separator, or nothing on one side of it.
    MissingSeparator,
    /// Language side contains characters outside `[A-Za-z-]`.
    InvalidLanguageTag,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MissingSeparator => write!(f, "expected `language=domain`"),
            SkipReason::InvalidLanguageTag => write!(f, "language tag must match [A-Za-z-]+"),
        }
    }
}

/// A line that did not make it into the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedLine {
    /// 1-based line number in the raw configuration.
    pub line_number: usize,
    pub content: String,
    pub reason: SkipReason,
}

/// Ordered mapping `language tag -> Binding`.
///
/// Immutable once built. An empty registry means multi-domain binding is off.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BindingsRegistry {
    bindings: Vec<Binding>,
}

impl BindingsRegistry {
    /// Parse a raw bindings string. Total: malformed lines are dropped silently.
    pub fn parse(raw: &str) -> Self {
        Self::parse_with_report(raw).0
    }

    /// Parse a raw bindings string and report every line that was skipped.
    pub fn parse_with_report(raw: &str) -> (Self, Vec<SkippedLine>) {
        let mut registry = Self::default();
        let mut skipped = Vec::new();

        for (index, line) in raw.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match parse_line(line) {
                Ok(binding) => registry.upsert(binding),
                Err(reason) => skipped.push(SkippedLine {
                    line_number: index + 1,
                    content: line.to_string(),
                    reason,
                }),
            }
        }

        (registry, skipped)
    }

    fn upsert(&mut self, binding: Binding) {
        match self
            .bindings
            .iter_mut()
            .find(|b| b.language_tag == binding.language_tag)
        {
            Some(existing) => *existing = binding,
            None => self.bindings.push(binding),
        }
    }

    /// Look up the binding for a language tag.
    pub fn get(&self, language_tag: &str) -> Option<&Binding> {
        self.bindings.iter().find(|b| b.language_tag == language_tag)
    }

    pub fn contains(&self, language_tag: &str) -> bool {
        self.get(language_tag).is_some()
    }

    /// Bindings in registry order.
    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.iter()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

fn parse_line(line: &str) -> Result<Binding, SkipReason> {
    let (language, domains) = line.split_once('=').ok_or(SkipReason::MissingSeparator)?;

    let language_tag = language.trim().replace('_', "-");
    let domains = domains.trim();
    if language_tag.is_empty() || domains.is_empty() {
        return Err(SkipReason::MissingSeparator);
    }

    if !language_tag
        .chars()
        .all(|c| c.is_ascii_alphabetic() || c == '-')
    {
        return Err(SkipReason::InvalidLanguageTag);
    }

    let mut parts = domains.split('|').map(|d| d.trim().to_string());
    let primary_domain = parts.next().unwrap_or_default();
    let secondary_domains = parts.collect();

    Ok(Binding {
        language_tag,
        primary_domain,
        secondary_domains,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_primary_and_secondary() {
        let registry = BindingsRegistry::parse(
            "en-GB=en.example.com|m.en.example.com|www.en.example.org\nfr-FR=fr.example.com",
        );

        assert_eq!(registry.len(), 2);
        let en = registry.get("en-GB").unwrap();
        assert_eq!(en.primary_domain, "en.example.com");
        assert_eq!(en.secondary_domains, vec!["m.en.example.com", "www.en.example.org"]);

        let fr = registry.get("fr-FR").unwrap();
        assert_eq!(fr.primary_domain, "fr.example.com");
        assert!(fr.secondary_domains.is_empty());
    }

    #[test]
    fn test_underscore_normalized() {
        let registry = BindingsRegistry::parse("  de_DE = de.example.com  ");
        assert!(registry.contains("de-DE"));
        assert!(!registry.contains("de_DE"));
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let raw = "\n\nno-separator\n=orphan.example.com\nen=\nnl1=nl.example.com\nes-ES=es.example.com\n";
        let (registry, skipped) = BindingsRegistry::parse_with_report(raw);

        assert_eq!(registry.len(), 1);
        assert!(registry.contains("es-ES"));
        assert_eq!(skipped.len(), 4);
        assert_eq!(skipped[0].line_number, 3);
        assert_eq!(skipped[0].reason, SkipReason::MissingSeparator);
        assert_eq!(skipped[3].reason, SkipReason::InvalidLanguageTag);
    }

    #[test]
    fn test_duplicate_overwrites_in_place() {
        let registry = BindingsRegistry::parse(
            "en=old.example.com\nfr=fr.example.com\nen=new.example.com|alt.example.com",
        );

        let tags: Vec<_> = registry.iter().map(|b| b.language_tag.as_str()).collect();
        assert_eq!(tags, vec!["en", "fr"]);
        assert_eq!(registry.get("en").unwrap().primary_domain, "new.example.com");
    }

    #[test]
    fn test_empty_input() {
        assert!(BindingsRegistry::parse("").is_empty());
        assert!(BindingsRegistry::parse("   \n \t\n").is_empty());
    }

    #[test]
    fn test_first_equals_splits() {
        let registry = BindingsRegistry::parse("en=en.example.com/?a=b");
        assert_eq!(registry.get("en").unwrap().primary_domain, "en.example.com/?a=b");
    }
}
