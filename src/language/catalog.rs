//! Language tag ⇄ SEF code catalog.

use serde::Serialize;

use crate::bindings::BindingsRegistry;
use crate::config::LanguageEntry;

/// One catalog row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogLanguage {
    pub tag: String,
    pub sef: String,
}

/// Ordered catalog of the site's languages.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LanguageCatalog {
    languages: Vec<CatalogLanguage>,
}

impl LanguageCatalog {
    /// Build from configured entries; bound tags missing from them get a derived SEF.
    pub fn build(entries: &[LanguageEntry], registry: &BindingsRegistry) -> Self {
        let mut catalog = Self::default();

        for entry in entries {
            let tag = entry.tag.trim().replace('_', "-");
            let sef = entry.sef.trim().to_string();
            if tag.is_empty() || sef.is_empty() || catalog.sef_for_tag(&tag).is_some() {
                continue;
            }
            catalog.languages.push(CatalogLanguage { tag, sef });
        }

        for binding in registry.iter() {
            if catalog.sef_for_tag(&binding.language_tag).is_some() {
                continue;
            }
            let sef = derive_sef(&binding.language_tag);
            if let Some(owner) = catalog.tag_for_sef(&sef) {
                tracing::warn!(
                    tag = %binding.language_tag,
                    sef = %sef,
                    owner = %owner,
                    "Derived SEF code already taken, language left out of the catalog"
                );
                continue;
            }
            catalog.languages.push(CatalogLanguage {
                tag: binding.language_tag.clone(),
                sef,
            });
        }

        catalog
    }

    pub fn sef_for_tag(&self, tag: &str) -> Option<&str> {
        self.languages
            .iter()
            .find(|l| l.tag == tag)
            .map(|l| l.sef.as_str())
    }

    pub fn tag_for_sef(&self, sef: &str) -> Option<&str> {
        self.languages
            .iter()
            .find(|l| l.sef == sef)
            .map(|l| l.tag.as_str())
    }

    pub fn contains_tag(&self, tag: &str) -> bool {
        self.sef_for_tag(tag).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogLanguage> {
        self.languages.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }
}

/// `en-GB` → `en`.
pub fn derive_sef(tag: &str) -> String {
    tag.split('-').next().unwrap_or(tag).to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(tag: &str, sef: &str) -> LanguageEntry {
        LanguageEntry {
            tag: tag.to_string(),
            sef: sef.to_string(),
        }
    }

    #[test]
    fn test_configured_entries_take_precedence() {
        let registry = BindingsRegistry::parse("en-GB=en.example.com\npt-BR=br.example.com");
        let catalog = LanguageCatalog::build(&[entry("pt_BR", "br")], &registry);

        assert_eq!(catalog.sef_for_tag("pt-BR"), Some("br"));
        assert_eq!(catalog.sef_for_tag("en-GB"), Some("en"));
        assert_eq!(catalog.tag_for_sef("br"), Some("pt-BR"));

        let order: Vec<_> = catalog.iter().map(|l| l.tag.as_str()).collect();
        assert_eq!(order, vec!["pt-BR", "en-GB"]);
    }

    #[test]
    fn test_blank_and_duplicate_entries_ignored() {
        let catalog = LanguageCatalog::build(
            &[entry("", "x"), entry("nl-NL", " "), entry("de-DE", "de"), entry("de-DE", "ger")],
            &BindingsRegistry::default(),
        );
        assert_eq!(catalog.iter().count(), 1);
        assert_eq!(catalog.sef_for_tag("de-DE"), Some("de"));
    }

    #[test]
    fn test_derived_sef_collision_keeps_first_tag() {
        let registry = BindingsRegistry::parse("en-GB=uk.example.com\nen-US=us.example.com");
        let catalog = LanguageCatalog::build(&[], &registry);

        assert_eq!(catalog.iter().count(), 1);
        assert_eq!(catalog.tag_for_sef("en"), Some("en-GB"));
        assert!(!catalog.contains_tag("en-US"));

        let catalog = LanguageCatalog::build(&[entry("en-US", "us")], &registry);
        assert_eq!(catalog.sef_for_tag("en-US"), Some("us"));
        assert_eq!(catalog.sef_for_tag("en-GB"), Some("en"));
    }

    #[test]
    fn test_derive_sef() {
        assert_eq!(derive_sef("en-GB"), "en");
        assert_eq!(derive_sef("FR"), "fr");
    }
}
