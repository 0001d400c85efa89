//! Outbound body rewriting.
//!
//! # Responsibilities
//! - Run the four scans for every bound language, in catalog order
//! - Decide the replacement for each match (same-language shortcut,
//!   canonical domain, secondary domain, enforce-domains)
//! - Splice replacements into the exact matched spans
//!
//! # Design Decisions
//! - Literal pattern matching over rendered markup, not an HTML parser
//! - Engine compiled once per configuration snapshot, reused by every request
//! - Ineligible URLs are left untouched

use std::ops::Range;
use std::time::Instant;

use regex::Regex;

use crate::bindings::{BindingsRegistry, DomainResolver};
use crate::config::LanguageConfig;
use crate::filter::ExclusionRules;
use crate::language::LanguageCatalog;
use crate::observability::{metrics, DebugTrace};
use crate::rewrite::patterns::{splice, LanguagePatterns, RewriteMatch, UrlShape};
use crate::rewrite::url::{domain_from_url, has_http_scheme, primary_url};

/// Per-render inputs supplied by the host.
#[derive(Debug, Clone, Copy)]
pub struct RenderPass<'a> {
    /// Tag of the language the page was rendered in.
    pub current_language: Option<&'a str>,
    /// Build `https://` primary URLs.
    pub https: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOutcome {
    pub body: String,
    pub replaced: usize,
}

/// One bound language with its compiled scans.
#[derive(Debug, Clone)]
pub struct BoundLanguage {
    pub tag: String,
    pub primary_domain: String,
    pub secondary_domains: Vec<String>,
    pub patterns: LanguagePatterns,
}

impl BoundLanguage {
    fn is_secondary(&self, domain: &str) -> bool {
        let www = format!("www.{domain}");
        self.secondary_domains
            .iter()
            .any(|d| d == domain || *d == www)
    }
}

#[derive(Debug, Clone)]
pub struct UrlRewriteEngine {
    targets: Vec<BoundLanguage>,
    all_domains: Vec<String>,
    known_domain_prefix: Option<Regex>,
    exclusions: ExclusionRules,
    enforce_domains: bool,
    sef_rewrite: bool,
}

impl UrlRewriteEngine {
    pub fn new(
        registry: &BindingsRegistry,
        catalog: &LanguageCatalog,
        settings: &LanguageConfig,
    ) -> Result<Self, regex::Error> {
        let mut targets = Vec::new();
        for language in catalog.iter() {
            let Some(binding) = registry.get(&language.tag) else {
                continue;
            };
            if language.sef.is_empty() || binding.primary_domain.is_empty() {
                continue;
            }
            targets.push(BoundLanguage {
                tag: language.tag.clone(),
                primary_domain: binding.primary_domain.clone(),
                secondary_domains: binding.secondary_domains.clone(),
                patterns: LanguagePatterns::new(&language.sef)?,
            });
        }

        let all_domains: Vec<String> = DomainResolver::new(registry)
            .all_domains()
            .into_iter()
            .filter(|d| !d.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            known_domain_prefix: known_domain_prefix(&all_domains)?,
            targets,
            all_domains,
            exclusions: ExclusionRules::new(&settings.exclude_components, &settings.exclude_urls),
            enforce_domains: settings.enforce_domains,
            sef_rewrite: settings.sef_rewrite,
        })
    }

    /// Bound languages in catalog order.
    pub fn languages(&self) -> &[BoundLanguage] {
        &self.targets
    }

    /// Fully qualified primary URL of `language` for this pass.
    pub fn primary_url_for(&self, language: &BoundLanguage, pass: &RenderPass<'_>) -> String {
        primary_url(&language.primary_domain, pass.https, self.sef_rewrite)
    }

    /// False when no language is bound; rewriting would be a no-op.
    pub fn is_active(&self) -> bool {
        !self.targets.is_empty()
    }

    /// Rewrite every bound language's URLs in `body`.
    pub fn rewrite(&self, body: &str, pass: &RenderPass<'_>, trace: &mut DebugTrace) -> RewriteOutcome {
        let started = Instant::now();
        let mut buffer = body.to_string();
        let mut replaced = 0;

        for target in &self.targets {
            let url = self.primary_url_for(target, pass);
            trace.message(format!("Inspecting language: {} / {}", target.patterns.sef(), url));

            let (next, n) = self.rewrite_short_urls(&buffer, target, &url, pass, trace);
            buffer = next;
            replaced += n;

            let (next, n) = self.rewrite_short_urls_with_index(&buffer, target, &url, trace);
            buffer = next;
            replaced += n;

            let (next, n) = self.rewrite_full_urls(&buffer, target, &url, trace);
            buffer = next;
            replaced += n;

            let (next, n) = self.rewrite_full_sef_urls(&buffer, target, &url, trace);
            buffer = next;
            replaced += n;
        }

        if self.is_active() {
            metrics::record_rewrite_duration(started.elapsed());
        }

        RewriteOutcome { body: buffer, replaced }
    }

    /// Short form: `"/<sef>/<rest>"`.
    pub fn rewrite_short_urls(
        &self,
        buffer: &str,
        target: &BoundLanguage,
        primary_url: &str,
        pass: &RenderPass<'_>,
        trace: &mut DebugTrace,
    ) -> (String, usize) {
        trace.start_timer("rewrite_short_urls");
        let same_language = pass.current_language == Some(target.tag.as_str());
        let matches = target.patterns.scan_short(buffer);

        let replacements = self.decide(&matches, trace, |m| {
            trace_match("Match shortened URL", m);
            if same_language {
                Some(format!("{}/{}{}", m.quote, m.path_remainder, m.closing_quote))
            } else {
                Some(format!("{}{}{}{}", m.quote, primary_url, m.path_remainder, m.closing_quote))
            }
        });

        self.finish(buffer, UrlShape::Short, replacements, "rewrite_short_urls", trace)
    }

    /// Short form with index: `"/index.php/<sef>/<rest>"`, only without URL rewriting.
    pub fn rewrite_short_urls_with_index(
        &self,
        buffer: &str,
        target: &BoundLanguage,
        primary_url: &str,
        trace: &mut DebugTrace,
    ) -> (String, usize) {
        if self.sef_rewrite {
            return (buffer.to_string(), 0);
        }

        trace.start_timer("rewrite_short_urls_with_index");
        let matches = target.patterns.scan_short_with_index(buffer);
        let replacements = self.decide(&matches, trace, |m| {
            trace_match("Match shortened URL with /index.php/", m);
            Some(format!("{}{}{}{}", m.quote, primary_url, m.path_remainder, m.closing_quote))
        });

        self.finish(
            buffer,
            UrlShape::ShortWithIndex,
            replacements,
            "rewrite_short_urls_with_index",
            trace,
        )
    }

    /// Absolute form: `http(s)://<known host>/<sef>/<rest>`.
    pub fn rewrite_full_urls(
        &self,
        buffer: &str,
        target: &BoundLanguage,
        primary_url: &str,
        trace: &mut DebugTrace,
    ) -> (String, usize) {
        trace.start_timer("rewrite_full_urls");
        let matches = target.patterns.scan_absolute(buffer);

        let replacements = self.decide(&matches, trace, |m| {
            trace_match("Match full URL", m);
            let domain = domain_from_url(m.authority)?;
            if !self.all_domains.iter().any(|d| d == domain) {
                return None;
            }

            let base = if target.is_secondary(domain) && !self.enforce_domains {
                primary_url.replacen(target.primary_domain.as_str(), domain, 1)
            } else {
                primary_url.to_string()
            };
            Some(format!("{}{}{}", base, m.path_remainder, m.closing_quote))
        });

        self.finish(buffer, UrlShape::Absolute, replacements, "rewrite_full_urls", trace)
    }

    /// SEF query form: `"...?lang=<sef>"` or `"...&lang=<sef>"`.
    pub fn rewrite_full_sef_urls(
        &self,
        buffer: &str,
        target: &BoundLanguage,
        primary_url: &str,
        trace: &mut DebugTrace,
    ) -> (String, usize) {
        if !target.patterns.has_sef_query(buffer) {
            return (buffer.to_string(), 0);
        }

        trace.start_timer("rewrite_full_sef_urls");
        let matches = target.patterns.scan_sef_query(buffer);
        let mut replacements = Vec::new();

        for m in &matches {
            let Some(path) = self.clean_sef_query_path(m.path_remainder) else {
                continue;
            };
            trace.message(format!("Match full URL: {} [{}]", path, m.language_sef));

            if !self.exclusions.is_url_eligible(&path) {
                continue;
            }
            replacements.push((
                m.span.clone(),
                format!("{}{}{}{}", m.quote, primary_url, path, m.closing_quote),
            ));
        }

        self.finish(buffer, UrlShape::SefQuery, replacements, "rewrite_full_sef_urls", trace)
    }

    /// Relative path of a SEF-query capture, or `None` when it must be skipped.
    fn clean_sef_query_path(&self, captured: &str) -> Option<String> {
        let path = captured.strip_suffix('?').unwrap_or(captured);
        let path = path.strip_prefix('/').unwrap_or(path);
        let path = match &self.known_domain_prefix {
            Some(prefix) => prefix.replace(path, "${rest}"),
            None => path.into(),
        };

        // unknown domain
        if has_http_scheme(&path) {
            return None;
        }

        // broken capture
        if path
            .chars()
            .next()
            .is_some_and(|c| !(c.is_ascii_alphanumeric() || c == '/'))
        {
            return None;
        }

        Some(path.trim_start_matches('/').to_string())
    }

    /// Apply the eligibility filter then `replace` to every match.
    fn decide<F>(
        &self,
        matches: &[RewriteMatch<'_>],
        trace: &mut DebugTrace,
        mut replace: F,
    ) -> Vec<(Range<usize>, String)>
    where
        F: FnMut(&RewriteMatch<'_>) -> Option<String>,
    {
        if matches.is_empty() {
            trace.message("No matches");
        }

        matches
            .iter()
            .filter(|m| self.exclusions.is_url_eligible(&m.unquoted()))
            .filter_map(|m| replace(m).map(|r| (m.span.clone(), r)))
            .collect()
    }

    fn finish(
        &self,
        buffer: &str,
        shape: UrlShape,
        replacements: Vec<(Range<usize>, String)>,
        timer: &'static str,
        trace: &mut DebugTrace,
    ) -> (String, usize) {
        let count = replacements.len();
        metrics::record_rewrites(shape.as_str(), count);
        trace.end_timer(timer);
        (splice(buffer, &replacements), count)
    }
}

fn trace_match(label: &str, m: &RewriteMatch<'_>) {
    tracing::trace!(shape = m.shape.as_str(), url = %m.full_text, "{}", label);
}

fn known_domain_prefix(domains: &[String]) -> Result<Option<Regex>, regex::Error> {
    if domains.is_empty() {
        return Ok(None);
    }

    let mut sorted: Vec<&String> = domains.iter().collect();
    sorted.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    sorted.dedup();

    let alternation = sorted
        .iter()
        .map(|d| regex::escape(d))
        .collect::<Vec<_>>()
        .join("|");
    // the host must end right after the known domain
    Regex::new(&format!("(?s)^https?://(?:{alternation})(?P<rest>[/:?#].*|$)")).map(Some)
}
